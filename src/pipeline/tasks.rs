// src/pipeline/tasks.rs

//! Leaf tasks of the asset pipeline.

use anyhow::Result;
use tracing::{debug, info};

use crate::collab::Transform;
use crate::engine::TaskContext;
use crate::pipeline::filesets;
use crate::registry::{TaskDef, TaskRegistry};

/// Register every pipeline task into `registry`.
pub fn register_defaults(registry: &mut TaskRegistry) -> crate::errors::Result<()> {
    let defs = [
        TaskDef::leaf("clean", clean).describe("Remove the output and intermediate directories"),
        TaskDef::leaf("images", images)
            .describe("Copy images into dist/img")
            .rebuildable(),
        TaskDef::leaf("fonts", fonts)
            .describe("Copy fonts into dist/fonts")
            .rebuildable(),
        TaskDef::leaf("html", html)
            .describe("Copy HTML documents (minified in production)")
            .rebuildable(),
        TaskDef::leaf("htmlmin", htmlmin).describe("Minify HTML in the output directory"),
        TaskDef::leaf("extras", extras).describe("Copy root-level passthrough files"),
        TaskDef::leaf("lint", lint).describe("Lint application scripts"),
        TaskDef::leaf("scripts", scripts)
            .describe("Compile scripts into dist/js (minified in production)")
            .rebuildable(),
        TaskDef::leaf("uglify", uglify).describe("Minify compiled scripts"),
        TaskDef::leaf("styles", styles)
            .describe("Compile and bundle stylesheets into dist/css")
            .rebuildable(),
        TaskDef::leaf("vendor", vendor).describe("Copy vendor libraries into dist/js/lib"),
        TaskDef::leaf("rev", rev).describe("Version js, css and images by content hash"),
        TaskDef::leaf("cache", cache).describe("Write the offline-cache manifest"),
        TaskDef::leaf("serve", serve).describe("Start the dev server on the output directory"),
    ];

    for def in defs {
        registry.register(def)?;
    }
    Ok(())
}

/// A registry holding exactly the pipeline tasks.
pub fn default_registry() -> crate::errors::Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    register_defaults(&mut registry)?;
    registry.check_compositions()?;
    Ok(registry)
}

async fn clean(cx: TaskContext) -> Result<()> {
    let layout = cx.layout();
    cx.pipeline().clear_directory(layout.dest.clone()).await?;
    cx.pipeline().clear_directory(layout.tmp.clone()).await?;
    Ok(())
}

async fn images(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::images(cx.layout());
    let written = cx.pipeline().copy(input, output).await?;
    debug!(files = written.len(), "images copied");
    Ok(())
}

async fn fonts(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::fonts(cx.layout());
    cx.pipeline().copy(input, output).await?;
    Ok(())
}

async fn extras(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::extras(cx.layout());
    cx.pipeline().copy(input, output).await?;
    Ok(())
}

async fn vendor(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::vendor(cx.layout());
    cx.pipeline().copy(input, output).await?;
    Ok(())
}

async fn html(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::html(cx.layout());
    cx.pipeline().copy(input, output).await?;
    if cx.build().production() {
        cx.start("htmlmin").await?;
    }
    Ok(())
}

async fn htmlmin(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::html_output(cx.layout());
    cx.pipeline()
        .transform(Transform::MinifyHtml, input, output)
        .await?;
    Ok(())
}

async fn lint(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::lint(cx.layout());
    let checked = cx.pipeline().transform(Transform::Lint, input, output).await?;
    debug!(files = checked.len(), "scripts linted");
    Ok(())
}

async fn scripts(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::scripts(cx.layout());
    cx.pipeline()
        .transform(Transform::Scripts, input, output)
        .await?;
    if cx.build().production() {
        cx.start("uglify").await?;
    }
    Ok(())
}

async fn uglify(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::script_output(cx.layout());
    cx.pipeline()
        .transform(Transform::MinifyScripts, input, output)
        .await?;
    Ok(())
}

async fn styles(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::styles(cx.layout());
    let step = Transform::Styles {
        bundle: filesets::STYLE_BUNDLE.to_string(),
    };
    cx.pipeline().transform(step, input, output).await?;
    Ok(())
}

async fn rev(cx: TaskContext) -> Result<()> {
    let (input, output) = filesets::revisioned(cx.layout());
    let versioned = cx.pipeline().transform(Transform::Revision, input, output).await?;
    info!(assets = versioned.len(), "assets versioned");
    Ok(())
}

async fn cache(cx: TaskContext) -> Result<()> {
    let layout = cx.layout();
    let (input, output) = filesets::precached(layout);
    let step = Transform::Precache {
        cache_id: layout.cache_id.clone(),
    };
    cx.pipeline().transform(step, input, output).await?;
    Ok(())
}

async fn serve(cx: TaskContext) -> Result<()> {
    let root = cx.layout().dest.clone();
    cx.server().start(root).await?;
    cx.build().mark_server_active();
    Ok(())
}

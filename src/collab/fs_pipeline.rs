// src/collab/fs_pipeline.rs

//! Filesystem-backed [`AssetPipeline`].

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};

use crate::collab::builtin;
use crate::collab::command::run_transform_command;
use crate::collab::fileset::{Fileset, OutputTarget, list_files};
use crate::collab::manifest;
use crate::collab::{AssetPipeline, Transform};
use crate::types::BoxFuture;

/// Runs transforms against the real filesystem.
///
/// A transform with an entry in `commands` (keyed by [`Transform::key`]) is
/// delegated to that shell command, run from `root`. Everything else uses the
/// built-in fallback on a blocking worker thread.
#[derive(Debug, Clone)]
pub struct FsPipeline {
    root: PathBuf,
    commands: BTreeMap<String, String>,
}

impl FsPipeline {
    pub fn new(root: impl Into<PathBuf>, commands: BTreeMap<String, String>) -> Self {
        Self {
            root: root.into(),
            commands,
        }
    }
}

impl AssetPipeline for FsPipeline {
    fn transform(
        &self,
        step: Transform,
        input: Fileset,
        output: OutputTarget,
    ) -> BoxFuture<anyhow::Result<Vec<PathBuf>>> {
        let root = self.root.clone();
        let command = self.commands.get(step.key()).cloned();

        Box::pin(async move {
            let files = collect(input.clone()).await?;
            debug!(step = %step, inputs = files.len(), "transform inputs collected");

            if let Some(cmd) = command {
                tokio::fs::create_dir_all(&output.dir)
                    .await
                    .with_context(|| format!("creating output dir {:?}", output.dir))?;
                run_transform_command(step.key(), &cmd, &root, &files, &output.dir).await?;
                let dir = output.dir.clone();
                let written = tokio::task::spawn_blocking(move || list_files(&dir)).await??;
                return Ok(written);
            }

            let written =
                tokio::task::spawn_blocking(move || run_builtin(&step, &files, &input, &output))
                    .await??;
            Ok(written)
        })
    }

    fn copy(&self, input: Fileset, output: OutputTarget) -> BoxFuture<anyhow::Result<Vec<PathBuf>>> {
        Box::pin(async move {
            let written = tokio::task::spawn_blocking(move || {
                let files = input.collect()?;
                builtin::copy_placed(&files, &input, &output)
            })
            .await??;
            debug!(files = written.len(), "copied");
            Ok(written)
        })
    }

    fn clear_directory(&self, path: PathBuf) -> BoxFuture<anyhow::Result<()>> {
        Box::pin(async move {
            let target = path.clone();
            let removed = tokio::task::spawn_blocking(move || match std::fs::remove_dir_all(&target) {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(err),
            })
            .await?
            .with_context(|| format!("clearing directory {:?}", path))?;

            if removed {
                info!(?path, "cleared directory");
            } else {
                debug!(?path, "nothing to clear");
            }
            Ok(())
        })
    }
}

async fn collect(input: Fileset) -> anyhow::Result<Vec<PathBuf>> {
    Ok(tokio::task::spawn_blocking(move || input.collect()).await??)
}

fn run_builtin(
    step: &Transform,
    files: &[PathBuf],
    input: &Fileset,
    output: &OutputTarget,
) -> anyhow::Result<Vec<PathBuf>> {
    match step {
        Transform::Styles { bundle } => builtin::bundle(files, output, bundle),
        Transform::Scripts => builtin::copy_placed(files, input, output),
        Transform::Lint => builtin::lint(files),
        Transform::MinifyHtml => builtin::minify_each(files, input, output, builtin::minify_html),
        Transform::MinifyScripts => {
            builtin::minify_each(files, input, output, builtin::minify_script)
        }
        Transform::Revision => manifest::revision(files, &output.dir),
        Transform::Precache { cache_id } => manifest::precache(files, &output.dir, cache_id),
    }
}

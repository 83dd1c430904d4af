use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetrun::collab::{AssetPipeline, DevServer, Fileset, LiveReload, OutputTarget, Transform};
use assetrun::compose::Request;
use assetrun::errors::{BuildError, Result};
use assetrun::types::BoxFuture;
use assetrun::watch::RebuildBackend;

use crate::journal::Journal;

/// One call made against a [`RecordingPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    Transform {
        step: Transform,
        input: Fileset,
        output: OutputTarget,
    },
    Copy {
        input: Fileset,
        output: OutputTarget,
    },
    Clear(PathBuf),
}

/// Asset pipeline that records every call and writes nothing.
///
/// Individual transform keys (`"uglify"`, `"styles"`, ...), `"copy"` or
/// `"clear"` can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingPipeline {
    calls: Arc<Mutex<Vec<PipelineCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<PipelineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Keys of every transform run, in call order.
    pub fn transform_keys(&self) -> Vec<&'static str> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                PipelineCall::Transform { step, .. } => Some(step.key()),
                _ => None,
            })
            .collect()
    }

    pub fn cleared(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PipelineCall::Clear(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn copied_to(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PipelineCall::Copy { output, .. } => Some(output.dir),
                _ => None,
            })
            .collect()
    }

    fn record(&self, key: &str, call: PipelineCall) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(key) {
            anyhow::bail!("{key} failed");
        }
        Ok(())
    }
}

impl AssetPipeline for RecordingPipeline {
    fn transform(
        &self,
        step: Transform,
        input: Fileset,
        output: OutputTarget,
    ) -> BoxFuture<anyhow::Result<Vec<PathBuf>>> {
        let key = step.key();
        let result = self.record(key, PipelineCall::Transform { step, input, output });
        Box::pin(async move { result.map(|()| Vec::new()) })
    }

    fn copy(&self, input: Fileset, output: OutputTarget) -> BoxFuture<anyhow::Result<Vec<PathBuf>>> {
        let result = self.record("copy", PipelineCall::Copy { input, output });
        Box::pin(async move { result.map(|()| Vec::new()) })
    }

    fn clear_directory(&self, path: PathBuf) -> BoxFuture<anyhow::Result<()>> {
        let result = self.record("clear", PipelineCall::Clear(path));
        Box::pin(async move { result })
    }
}

/// Live-reload client that counts notifications.
#[derive(Debug, Clone, Default)]
pub struct CountingReload {
    count: Arc<AtomicUsize>,
}

impl CountingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl LiveReload for CountingReload {
    fn notify_reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Dev server that records the roots it was asked to serve.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevServer {
    roots: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingDevServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.lock().unwrap().clone()
    }
}

impl DevServer for RecordingDevServer {
    fn start(&self, root: PathBuf) -> BoxFuture<anyhow::Result<()>> {
        self.roots.lock().unwrap().push(root);
        Box::pin(async { Ok(()) })
    }
}

/// Rebuild backend that records each request into a [`Journal`] (keyed by
/// the request's display form) and takes `duration` to finish.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    journal: Journal,
    duration: Duration,
    fail: bool,
}

impl RecordingBackend {
    pub fn new(journal: Journal, duration: Duration) -> Self {
        Self {
            journal,
            duration,
            fail: false,
        }
    }

    /// Every rebuild reports failure after running.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl RebuildBackend for RecordingBackend {
    fn rebuild(&self, request: Request) -> BoxFuture<Result<()>> {
        let journal = self.journal.clone();
        let duration = self.duration;
        let fail = self.fail;
        Box::pin(async move {
            let label = request.to_string();
            journal.start(&label);
            tokio::time::sleep(duration).await;
            journal.finish(&label);
            if fail {
                return Err(BuildError::TaskExecution {
                    task: label,
                    source: anyhow::anyhow!("rebuild failed"),
                });
            }
            Ok(())
        })
    }
}

// src/collab/reload.rs

//! Live-reload signalling and the bundled dev-server stand-in.

use std::path::PathBuf;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::collab::{DevServer, LiveReload};
use crate::types::BoxFuture;

/// Fan-out of reload signals to any number of subscribers (dev servers,
/// browser bridges, tests).
#[derive(Debug, Clone)]
pub struct BroadcastReload {
    tx: broadcast::Sender<()>,
}

impl BroadcastReload {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastReload {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload for BroadcastReload {
    fn notify_reload(&self) {
        // No subscribers is fine: nobody is listening yet.
        let receivers = self.tx.send(()).unwrap_or(0);
        debug!(receivers, "reload signal sent");
    }
}

/// Dev server that only logs what it would serve and every reload it would
/// push to browsers. The real HTTP/websocket server lives outside this crate.
#[derive(Debug, Clone)]
pub struct LoggingDevServer {
    reload: BroadcastReload,
}

impl LoggingDevServer {
    pub fn new(reload: BroadcastReload) -> Self {
        Self { reload }
    }
}

impl DevServer for LoggingDevServer {
    fn start(&self, root: PathBuf) -> BoxFuture<anyhow::Result<()>> {
        let mut rx = self.reload.subscribe();
        Box::pin(async move {
            info!(?root, "dev server serving output directory");
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(()) => info!(?root, "reloading connected browsers"),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "dev server lagged behind reload signals");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                debug!("dev server reload loop ended");
            });
            Ok(())
        })
    }
}

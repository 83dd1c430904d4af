// src/watch/debounce.rs

//! Per-rule debounce and coalescing.
//!
//! Each watch rule owns a [`RuleMachine`] (pure state, no IO) driven by a
//! small tokio actor spawned with [`spawn_rule`]. The machine guarantees:
//!
//! - N events inside one debounce window produce one run;
//! - events that arrive while the rule is running queue exactly one
//!   follow-up run (debounced again once the current run ends);
//! - a rule never has two runs in flight.
//!
//! Distinct rules have distinct actors and may run concurrently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::compose::Request;
use crate::engine::Engine;
use crate::errors::Result;
use crate::types::BoxFuture;
use crate::watch::rules::WatchRule;

/// What a watch rule runs when its debounce window elapses.
///
/// The engine is the production implementation; tests provide fakes that
/// record calls and control timing.
pub trait RebuildBackend: Send + Sync + 'static {
    fn rebuild(&self, request: Request) -> BoxFuture<Result<()>>;
}

impl RebuildBackend for Engine {
    fn rebuild(&self, request: Request) -> BoxFuture<Result<()>> {
        let engine = self.clone();
        Box::pin(async move { engine.run(&request).await })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Idle,
    /// Waiting for the window to elapse without further events.
    Pending { deadline: Instant },
    /// A run is in flight. `queued` records events seen meanwhile.
    Running { queued: bool },
}

/// idle -> pending -> running -> idle, with re-entry into pending when an
/// event was queued during the run.
#[derive(Debug, Clone)]
pub struct RuleMachine {
    state: RuleState,
    window: Duration,
}

impl RuleMachine {
    pub fn new(window: Duration) -> Self {
        Self {
            state: RuleState::Idle,
            window,
        }
    }

    pub fn state(&self) -> RuleState {
        self.state
    }

    /// When the pending window elapses, if a run is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            RuleState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// A matching file event arrived at `now`.
    pub fn on_event(&mut self, now: Instant) {
        self.state = match self.state {
            RuleState::Idle | RuleState::Pending { .. } => RuleState::Pending {
                deadline: now + self.window,
            },
            RuleState::Running { .. } => RuleState::Running { queued: true },
        };
    }

    /// Returns true (and moves to running) if the pending window has elapsed
    /// at `now`.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.state {
            RuleState::Pending { deadline } if now >= deadline => {
                self.state = RuleState::Running { queued: false };
                true
            }
            _ => false,
        }
    }

    /// The in-flight run ended (success or failure) at `now`.
    pub fn on_run_finished(&mut self, now: Instant) {
        self.state = match self.state {
            RuleState::Running { queued: true } => RuleState::Pending {
                deadline: now + self.window,
            },
            RuleState::Running { queued: false } => RuleState::Idle,
            other => {
                warn!(state = ?other, "run finished while not running");
                other
            }
        };
    }
}

/// Sending half of a rule actor. Dropping every clone stops the actor.
#[derive(Debug, Clone)]
pub struct RuleTrigger {
    label: String,
    tx: mpsc::UnboundedSender<String>,
}

impl RuleTrigger {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Report a matching change. `path` is only used for logging.
    pub fn notify(&self, path: impl Into<String>) {
        if self.tx.send(path.into()).is_err() {
            debug!(rule = %self.label, "rule actor already stopped");
        }
    }
}

/// Spawn the debounce actor for `rule`.
pub fn spawn_rule(
    rule: &WatchRule,
    window: Duration,
    backend: Arc<dyn RebuildBackend>,
) -> RuleTrigger {
    let (tx, rx) = mpsc::unbounded_channel();
    let label = rule.label().to_string();
    tokio::spawn(run_rule_actor(
        label.clone(),
        rule.request().clone(),
        window,
        backend,
        rx,
    ));
    RuleTrigger { label, tx }
}

async fn run_rule_actor(
    label: String,
    request: Request,
    window: Duration,
    backend: Arc<dyn RebuildBackend>,
    mut events: mpsc::UnboundedReceiver<String>,
) {
    let mut machine = RuleMachine::new(window);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

    debug!(rule = %label, %request, ?window, "watch rule active");

    loop {
        let deadline = machine.deadline();

        tokio::select! {
            maybe_path = events.recv() => {
                let Some(path) = maybe_path else {
                    break;
                };
                debug!(rule = %label, %path, "change matched");
                machine.on_event(Instant::now());
            }

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if machine.on_deadline(Instant::now()) {
                    info!(rule = %label, %request, "rebuilding");
                    let fut = backend.rebuild(request.clone());
                    let done_tx = done_tx.clone();
                    let label = label.clone();
                    tokio::spawn(async move {
                        match fut.await {
                            Ok(()) => info!(rule = %label, "rebuild finished"),
                            Err(err) => error!(rule = %label, error = %err, "rebuild failed; still watching"),
                        }
                        let _ = done_tx.send(());
                    });
                }
            }

            Some(()) = done_rx.recv() => {
                machine.on_run_finished(Instant::now());
                if machine.deadline().is_some() {
                    debug!(rule = %label, "changes arrived during rebuild; scheduling follow-up");
                }
            }
        }
    }

    debug!(rule = %label, "watch rule stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(200);

    #[test]
    fn events_inside_the_window_push_the_deadline_out() {
        let t0 = Instant::now();
        let mut m = RuleMachine::new(WINDOW);

        m.on_event(t0);
        m.on_event(t0 + Duration::from_millis(150));
        assert!(!m.on_deadline(t0 + Duration::from_millis(200)));
        assert_eq!(m.deadline(), Some(t0 + Duration::from_millis(350)));
        assert!(m.on_deadline(t0 + Duration::from_millis(350)));
        assert_eq!(m.state(), RuleState::Running { queued: false });
    }

    #[test]
    fn events_while_running_queue_one_follow_up() {
        let t0 = Instant::now();
        let mut m = RuleMachine::new(WINDOW);
        m.on_event(t0);
        assert!(m.on_deadline(t0 + WINDOW));

        m.on_event(t0 + Duration::from_millis(300));
        m.on_event(t0 + Duration::from_millis(310));
        assert_eq!(m.state(), RuleState::Running { queued: true });
        assert_eq!(m.deadline(), None);

        let finished = t0 + Duration::from_millis(500);
        m.on_run_finished(finished);
        assert_eq!(m.deadline(), Some(finished + WINDOW));
        assert!(m.on_deadline(finished + WINDOW));
        m.on_run_finished(finished + Duration::from_secs(1));
        assert_eq!(m.state(), RuleState::Idle);
    }

    #[test]
    fn deadline_is_ignored_unless_pending() {
        let t0 = Instant::now();
        let mut m = RuleMachine::new(WINDOW);
        assert!(!m.on_deadline(t0 + Duration::from_secs(10)));
        assert_eq!(m.state(), RuleState::Idle);
    }
}

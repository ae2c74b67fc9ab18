//! Host readiness guard.
//!
//! Content scripts can run before the page has parsed far enough to have a
//! `<body>`. Work that needs the body is parked here and retried on a short
//! interval until the body shows up. There is no retry limit: a slow page
//! still gets its overlay. The returned [`ReadinessWait`] lets an owner that
//! lost interest cancel the pending action instead of leaking it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::dom::HostDocument;

/// Default interval between body checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A deferred action waiting for the host body
#[derive(Debug, Clone)]
pub struct ReadinessWait {
    token: CancellationToken,
    done: Rc<Cell<bool>>,
}

impl ReadinessWait {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            done: Rc::new(Cell::new(false)),
        }
    }

    /// Stop waiting. The action will not run unless it already has.
    pub fn cancel(&self) {
        if !self.done.get() {
            self.token.cancel();
        }
    }

    /// True once the action has run
    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Still waiting for the body
    pub fn is_pending(&self) -> bool {
        !self.is_done() && !self.is_cancelled()
    }
}

/// Run `perform` once the document has a body.
///
/// If the body already exists, `perform` runs before this returns. Otherwise
/// a local task polls every `interval` and runs it on the first check that
/// finds a body.
///
/// # Panics
///
/// Deferring spawns onto the current [`tokio::task::LocalSet`]; calling this
/// for a document without a body outside a `LocalSet` panics.
pub fn when_body_ready<D, F>(document: &D, interval: Duration, perform: F) -> ReadinessWait
where
    D: HostDocument,
    F: FnOnce() + 'static,
{
    let wait = ReadinessWait::new();

    if document.body().is_some() {
        wait.done.set(true);
        perform();
        return wait;
    }

    tracing::debug!(
        interval_ms = interval.as_millis() as u64,
        "Host body not ready, deferring"
    );

    let document = document.clone();
    let token = wait.token.clone();
    let done = wait.done.clone();
    let mut perform = Some(perform);

    tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and the body was just checked
        ticker.tick().await;

        let mut attempts: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(attempts, "Readiness wait cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    attempts += 1;
                    if document.body().is_some() {
                        tracing::debug!(attempts, "Host body ready");
                        done.set(true);
                        if let Some(perform) = perform.take() {
                            perform();
                        }
                        return;
                    }
                }
            }
        }
    });

    wait
}

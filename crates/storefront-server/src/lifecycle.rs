//! Server lifecycle states and the shutdown report.
//!
//! The server moves strictly forward through
//! `Starting -> Listening -> Draining -> Stopped`. Any number of
//! [`LifecycleWatch`] handles can observe the transitions.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;

/// A phase of the server's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Configured but not yet accepting connections.
    Starting,
    /// Accepting connections and serving requests.
    Listening,
    /// No longer accepting connections; in-flight requests may finish.
    Draining,
    /// Terminal. No request is being served.
    Stopped,
}

impl LifecycleState {
    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight connection finished before the ceiling.
    Completed,
    /// The ceiling expired and the remaining connections were aborted.
    Forced {
        /// Connections still open when the ceiling expired.
        remaining: usize,
    },
}

impl DrainOutcome {
    /// Returns `true` if the drain was cut short.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        matches!(self, Self::Forced { .. })
    }
}

/// Summary returned once the server has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// How the drain ended.
    pub outcome: DrainOutcome,
    /// Time spent between leaving `Listening` and reaching `Stopped`.
    pub drain_elapsed: Duration,
}

/// Owner side of the lifecycle state.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Starting);
        Self { tx }
    }

    /// Moves to `next` if it is later than the current state.
    ///
    /// Returns `true` if the state changed.
    pub(crate) fn advance(&self, next: LifecycleState) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!(state = %next, "lifecycle transition");
        }
        changed
    }

    pub(crate) fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> LifecycleWatch {
        LifecycleWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the server's lifecycle state.
#[derive(Debug, Clone)]
pub struct LifecycleWatch {
    rx: watch::Receiver<LifecycleState>,
}

impl LifecycleWatch {
    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> LifecycleState {
        *self.rx.borrow()
    }

    /// Waits until the server has reached `state` or a later one.
    ///
    /// Returns the state actually observed. If the server is dropped before
    /// getting there, the last known state is returned.
    pub async fn reached(&mut self, state: LifecycleState) -> LifecycleState {
        let observed = self
            .rx
            .wait_for(|current| *current >= state)
            .await
            .map(|current| *current);
        observed.unwrap_or_else(|_| *self.rx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_ordered() {
        assert!(LifecycleState::Starting < LifecycleState::Listening);
        assert!(LifecycleState::Listening < LifecycleState::Draining);
        assert!(LifecycleState::Draining < LifecycleState::Stopped);
    }

    #[test]
    fn test_advance_only_moves_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Starting);

        assert!(lifecycle.advance(LifecycleState::Listening));
        assert!(lifecycle.advance(LifecycleState::Draining));
        assert!(!lifecycle.advance(LifecycleState::Listening));
        assert!(!lifecycle.advance(LifecycleState::Draining));
        assert_eq!(lifecycle.state(), LifecycleState::Draining);
    }

    #[tokio::test]
    async fn test_watch_observes_transitions() {
        let lifecycle = Lifecycle::new();
        let mut watch = lifecycle.subscribe();
        assert_eq!(watch.current(), LifecycleState::Starting);

        let waiter = tokio::spawn(async move { watch.reached(LifecycleState::Draining).await });
        lifecycle.advance(LifecycleState::Listening);
        lifecycle.advance(LifecycleState::Stopped);

        assert_eq!(waiter.await.unwrap(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_reached_returns_last_state_when_dropped() {
        let lifecycle = Lifecycle::new();
        let mut watch = lifecycle.subscribe();
        lifecycle.advance(LifecycleState::Listening);
        drop(lifecycle);

        assert_eq!(
            watch.reached(LifecycleState::Stopped).await,
            LifecycleState::Listening
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(LifecycleState::Draining.to_string(), "draining");
        assert!(DrainOutcome::Forced { remaining: 1 }.is_forced());
        assert!(!DrainOutcome::Completed.is_forced());
    }
}

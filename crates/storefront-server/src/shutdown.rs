//! Termination signal handling.
//!
//! A [`ShutdownSignal`] is the single trigger for the Listening to Draining
//! transition. In production it is fired by SIGINT or SIGTERM; tests fire it
//! by hand.
//!
//! # Example
//!
//! ```rust
//! use storefront_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let for_task = shutdown.clone();
//!
//! for_task.trigger();
//! assert!(shutdown.is_triggered());
//! ```

use std::io;

use tokio_util::sync::CancellationToken;

/// A cloneable, one-shot shutdown trigger.
///
/// All clones observe the same trigger. Triggering more than once has no
/// further effect.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal fired by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// The signal handlers are registered before this returns, so a signal
    /// arriving right after is not lost. Must be called inside a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the handlers cannot be registered.
    pub fn with_os_signals() -> io::Result<Self> {
        let signal = Self::new();
        let listener = OsSignals::register()?;
        let trigger = signal.clone();

        tokio::spawn(async move {
            match listener.recv().await {
                Ok(name) => {
                    tracing::info!(signal = name, "termination signal received, shutting down server");
                }
                Err(e) => {
                    tracing::error!(error = %e, "signal listener failed, shutting down server");
                }
            }
            trigger.trigger();
        });

        Ok(signal)
    }

    /// Fires the signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(unix)]
struct OsSignals {
    terminate: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(mut self) -> io::Result<&'static str> {
        tokio::select! {
            _ = self.terminate.recv() => Ok("SIGTERM"),
            _ = self.interrupt.recv() => Ok("SIGINT"),
        }
    }
}

#[cfg(not(unix))]
struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> io::Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}

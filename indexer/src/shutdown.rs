//! Stop requests for the scan loop and the status server.
//!
//! A stop is level-triggered: once requested it stays requested, so a task
//! that was busy when the signal arrived still sees it the next time it
//! looks. The scanner looks after every committed block, which makes a
//! block the smallest amount of work a stop can interrupt. A block that has
//! begun its unit of work is always committed and checkpointed first.

use tokio::signal;
use tokio::sync::watch;

/// Owns the stop flag. Dropping the controller counts as a stop request.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// A task's view of the stop flag.
#[derive(Clone, Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Whether a stop has been requested. Never blocks.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once a stop is requested.
    pub async fn requested(&mut self) {
        // An error means the controller is gone, which is a stop too.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request a stop programmatically.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Wait for SIGTERM or SIGINT, then request a stop.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "cannot install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, finishing the current block"); }
            _ = terminate => { tracing::info!("received SIGTERM, finishing the current block"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

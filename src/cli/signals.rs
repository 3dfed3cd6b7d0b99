//! Signal handling for the rip command

use colored::Colorize;

use crate::application::CancelFlag;

/// Turns SIGINT/SIGTERM into a job cancellation.
///
/// Repeated signals are harmless: the flag is only ever set once.
pub struct ShutdownSignal {
    cancel: CancelFlag,
}

impl ShutdownSignal {
    /// Create a handler that trips `cancel`
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Install the handlers on the current runtime
    #[cfg(unix)]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        use tokio::signal::unix::{signal, SignalKind};

        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let mut stream = signal(kind)?;
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    Self::trip(&cancel);
                }
            });
        }
        Ok(())
    }

    /// Install the handlers on the current runtime
    #[cfg(not(unix))]
    pub fn setup(&self) -> Result<(), std::io::Error> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                Self::trip(&cancel);
            }
        });
        Ok(())
    }

    fn trip(cancel: &CancelFlag) {
        if cancel.cancel() {
            eprintln!(
                "\n{} Cancelling, waiting for running FFmpeg processes to stop...",
                "↓".cyan()
            );
        }
    }
}

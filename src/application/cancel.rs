//! Job-wide cancellation flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Cancellation flag for one job.
///
/// Cloned into every stage and worker. Setting it is idempotent and
/// irreversible: there is no reset. Stages poll [`CancelFlag::is_cancelled`]
/// between units of work; subprocess adapters await
/// [`CancelFlag::cancelled`] to stop their child process.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    token: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `true` only for the call that set it.
    pub fn cancel(&self) -> bool {
        let first = !self.requested.swap(true, Ordering::SeqCst);
        if first {
            tracing::info!("Cancellation requested");
            self.token.cancel();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once the flag is set
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

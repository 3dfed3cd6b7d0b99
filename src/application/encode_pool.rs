//! Bounded parallel encoding
//!
//! A fixed number of workers pull `(track, source)` items from a shared
//! queue, each driving one encode to completion before taking the next.
//! Results are delivered over a channel in completion order.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::domain::audio::Bitrate;

use super::cancel::CancelFlag;
use super::ports::{AudioEncoder, EncodeError};

/// One file to encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeWork {
    pub track: u32,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Outcome of one encode
#[derive(Debug, Clone)]
pub struct EncodeResult {
    pub track: u32,
    pub output: PathBuf,
    pub error: Option<EncodeError>,
}

impl EncodeResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn was_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(EncodeError::is_cancelled)
    }
}

/// Worker pool around an [`AudioEncoder`]
pub struct EncodePool<E: AudioEncoder + 'static> {
    encoder: Arc<E>,
    max_workers: usize,
}

impl<E: AudioEncoder + 'static> EncodePool<E> {
    pub fn new(encoder: Arc<E>, max_workers: usize) -> Self {
        Self {
            encoder,
            max_workers: max_workers.max(1),
        }
    }

    /// Workers used for a batch of `batch_len` items
    pub fn workers_for(&self, batch_len: usize) -> usize {
        self.max_workers.min(batch_len).max(1)
    }

    /// Start encoding `items` and return the result stream.
    ///
    /// The stream closes once every worker has exited. After `cancel` is
    /// set no new item is started; queued items produce no result and
    /// in-flight encodes see the flag through the encoder itself.
    ///
    /// Sources are consumed: a worker removes its linear file once the
    /// encode attempt is over.
    pub fn run(
        &self,
        items: Vec<EncodeWork>,
        bitrate: Bitrate,
        cancel: CancelFlag,
    ) -> mpsc::UnboundedReceiver<EncodeResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        if items.is_empty() {
            return rx;
        }

        let workers = self.workers_for(items.len());
        tracing::info!(items = items.len(), workers, "Starting parallel encode");

        let queue = Arc::new(Mutex::new(VecDeque::from(items)));
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let encoder = Arc::clone(&self.encoder);
            let cancel = cancel.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        tracing::debug!(worker, "Worker stopping on cancel");
                        break;
                    }
                    let Some(work) = next_item(&queue) else {
                        break;
                    };

                    tracing::debug!(worker, track = work.track, source = %work.source.display(), "Encoding");
                    let outcome = encode_isolated(&encoder, &work, bitrate, &cancel).await;
                    discard_source(&work.source).await;

                    let result = EncodeResult {
                        track: work.track,
                        output: work.destination,
                        error: outcome.err(),
                    };
                    if tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }

        rx
    }
}

/// Run one encode on its own task so a panicking encoder costs a single
/// item instead of the worker and everything it would still pick up.
async fn encode_isolated<E: AudioEncoder + 'static>(
    encoder: &Arc<E>,
    work: &EncodeWork,
    bitrate: Bitrate,
    cancel: &CancelFlag,
) -> Result<(), EncodeError> {
    let encoder = Arc::clone(encoder);
    let cancel = cancel.clone();
    let source = work.source.clone();
    let destination = work.destination.clone();

    let attempt = tokio::spawn(async move {
        encoder
            .encode(&source, &destination, bitrate, None, &cancel)
            .await
    });

    match attempt.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(track = work.track, error = %e, "Encoder task ended abnormally");
            Err(EncodeError::Failed(format!("Encoder task ended abnormally: {}", e)))
        }
    }
}

fn next_item(queue: &Mutex<VecDeque<EncodeWork>>) -> Option<EncodeWork> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

async fn discard_source(path: &std::path::Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove intermediate file"),
    }
}

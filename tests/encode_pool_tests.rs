//! Encode worker pool tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use audiobook_ripper::application::ports::{AudioEncoder, EncodeError, ProgressCallback};
use audiobook_ripper::application::{CancelFlag, EncodePool, EncodeWork};
use audiobook_ripper::domain::Bitrate;

/// Encoder that tracks how many encodes run at once
#[derive(Default)]
struct CountingEncoder {
    running: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
    /// Per-source delay; unlisted sources use `default_delay`
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    fail: Option<String>,
    panic_on: Option<String>,
}

impl CountingEncoder {
    fn with_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl AudioEncoder for CountingEncoder {
    async fn encode(
        &self,
        source: &Path,
        destination: &Path,
        _bitrate: Bitrate,
        _on_progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> Result<(), EncodeError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.panic_on.as_deref() == Some(name.as_str()) {
            panic!("decoder state corrupted in {}", name);
        }

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays.get(&name).copied().unwrap_or(self.default_delay);

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(EncodeError::Cancelled),
            _ = tokio::time::sleep(delay) => {
                if self.fail.as_deref() == Some(name.as_str()) {
                    Err(EncodeError::Failed("bad frame".to_string()))
                } else {
                    tokio::fs::write(destination, b"mp3")
                        .await
                        .map_err(|e| EncodeError::Failed(e.to_string()))
                }
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn batch(dir: &TempDir, count: u32) -> Vec<EncodeWork> {
    (1..=count)
        .map(|track| {
            let source = dir.path().join(format!("track_{:02}.wav", track));
            std::fs::write(&source, b"pcm").unwrap();
            EncodeWork {
                track,
                source,
                destination: dir.path().join(format!("{:02}.mp3", track)),
            }
        })
        .collect()
}

#[tokio::test]
async fn never_exceeds_worker_limit() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(CountingEncoder::with_delay(Duration::from_millis(30)));
    let pool = EncodePool::new(Arc::clone(&encoder), 3);

    let mut rx = pool.run(batch(&dir, 9), Bitrate::default(), CancelFlag::new());
    let mut results = 0;
    while rx.recv().await.is_some() {
        results += 1;
    }

    assert_eq!(results, 9);
    let peak = encoder.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {}", peak);
    assert!(peak > 1, "batch ran serially");
}

#[tokio::test]
async fn sources_are_consumed_and_outputs_written() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(CountingEncoder::default());
    let pool = EncodePool::new(encoder, 2);
    let items = batch(&dir, 4);
    let sources: Vec<PathBuf> = items.iter().map(|w| w.source.clone()).collect();

    let mut rx = pool.run(items, Bitrate::default(), CancelFlag::new());
    while let Some(result) = rx.recv().await {
        assert!(result.is_ok());
        assert!(result.output.exists());
    }

    assert!(sources.iter().all(|s| !s.exists()));
}

#[tokio::test]
async fn results_arrive_in_completion_order() {
    let dir = TempDir::new().unwrap();
    let mut encoder = CountingEncoder::default();
    encoder
        .delays
        .insert("track_01.wav".to_string(), Duration::from_millis(200));
    encoder
        .delays
        .insert("track_02.wav".to_string(), Duration::from_millis(10));
    let pool = EncodePool::new(Arc::new(encoder), 2);

    let mut rx = pool.run(batch(&dir, 2), Bitrate::default(), CancelFlag::new());
    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();

    assert_eq!(first.track, 2);
    assert_eq!(second.track, 1);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn failure_does_not_stop_other_items() {
    let dir = TempDir::new().unwrap();
    let encoder = CountingEncoder {
        fail: Some("track_02.wav".to_string()),
        ..Default::default()
    };
    let pool = EncodePool::new(Arc::new(encoder), 1);

    let mut rx = pool.run(batch(&dir, 3), Bitrate::default(), CancelFlag::new());
    let mut failed = Vec::new();
    let mut ok = Vec::new();
    while let Some(result) = rx.recv().await {
        if result.is_ok() {
            ok.push(result.track);
        } else {
            assert!(!result.was_cancelled());
            failed.push(result.track);
        }
    }

    assert_eq!(failed, vec![2]);
    assert_eq!(ok, vec![1, 3]);
}

#[tokio::test]
async fn panicking_encode_still_yields_a_result() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(CountingEncoder {
        panic_on: Some("track_03.wav".to_string()),
        ..Default::default()
    });
    let pool = EncodePool::new(Arc::clone(&encoder), 2);
    let items = batch(&dir, 5);
    let sources: Vec<PathBuf> = items.iter().map(|w| w.source.clone()).collect();

    let mut rx = pool.run(items, Bitrate::default(), CancelFlag::new());
    let results = tokio::time::timeout(Duration::from_secs(5), async {
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    })
    .await
    .expect("result stream closes");

    let mut tracks: Vec<u32> = results.iter().map(|r| r.track).collect();
    tracks.sort_unstable();
    assert_eq!(tracks, vec![1, 2, 3, 4, 5]);

    let failed: Vec<_> = results.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].track, 3);
    assert!(matches!(failed[0].error, Some(EncodeError::Failed(_))));
    assert!(!failed[0].was_cancelled());

    // The worker that hit the panic kept going
    assert_eq!(encoder.started.load(Ordering::SeqCst), 5);
    assert!(sources.iter().all(|s| !s.exists()));
}

#[tokio::test]
async fn cancel_stops_dispatch() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(CountingEncoder::with_delay(Duration::from_millis(40)));
    let pool = EncodePool::new(Arc::clone(&encoder), 1);
    let cancel = CancelFlag::new();

    let mut rx = pool.run(batch(&dir, 10), Bitrate::default(), cancel.clone());
    let first = rx.recv().await.unwrap();
    assert!(first.is_ok());
    cancel.cancel();

    let mut rest = Vec::new();
    while let Some(result) = rx.recv().await {
        rest.push(result);
    }

    // At most the item picked up before the flag was seen
    assert!(rest.len() <= 1, "{} results after cancel", rest.len());
    assert!(rest.iter().all(|r| r.is_ok() || r.was_cancelled()));
    assert!(encoder.started.load(Ordering::SeqCst) <= 2);
    assert_eq!(encoder.running.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancel_interrupts_running_encodes() {
    let dir = TempDir::new().unwrap();
    let encoder = Arc::new(CountingEncoder::with_delay(Duration::from_secs(30)));
    let pool = EncodePool::new(Arc::clone(&encoder), 2);
    let cancel = CancelFlag::new();

    let mut rx = pool.run(batch(&dir, 4), Bitrate::default(), cancel.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let results = tokio::time::timeout(Duration::from_secs(5), async {
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    })
    .await
    .expect("workers exit promptly after cancel");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.was_cancelled()));
    assert!(results.iter().all(|r| !r.output.exists()));
}

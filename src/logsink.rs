// ABOUTME: Best-effort async sink appending error lines to logs/error.log (§6)
// ABOUTME: Backed by a bounded mpsc channel; a full channel drops the line, never blocks a caller

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 1024;

/// A cloneable handle applications use to report errors without waiting on disk I/O.
///
/// Never part of the core's correctness contract: a backed-up or dead sink only ever
/// increments [`ErrorSink::dropped_count`], it never causes a connection to fail (§6).
#[derive(Clone)]
pub struct ErrorSink {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
}

impl ErrorSink {
    /// Spawns the background writer task and returns a handle to it.
    pub fn spawn(log_path: impl Into<PathBuf>) -> ErrorSink {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));
        tokio::spawn(run_writer(log_path.into(), rx));
        ErrorSink { tx, dropped }
    }

    /// Enqueues `line` for the background writer; drops it silently (bumping the counter)
    /// if the channel is full.
    pub fn record(&self, line: impl Into<String>) {
        if self.tx.try_send(line.into()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<String>) {
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).await;
    let mut file = match file {
        Ok(file) => file,
        Err(source) => {
            warn!(error = %source, path = %path.display(), "error sink could not open log file");
            return;
        }
    };

    while let Some(line) = rx.recv().await {
        if let Err(source) = file.write_all(format!("{line}\n").as_bytes()).await {
            warn!(error = %source, "error sink write failed");
        }
    }
}

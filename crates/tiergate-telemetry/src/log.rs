//! Append-only NDJSON routing log
//!
//! Entries are handed to a background task over an unbounded channel so
//! recording never blocks a response. Each write is bounded by a timeout;
//! failures are logged and the entry is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::entry::RoutingLogEntry;

enum LogCommand {
    Append(Box<RoutingLogEntry>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background log writer
#[derive(Clone)]
pub struct RoutingLog {
    tx: mpsc::UnboundedSender<LogCommand>,
    path: PathBuf,
}

impl RoutingLog {
    /// Spawn the writer task for `path`
    ///
    /// The file and its parent directory are created on the first write.
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn spawn(path: PathBuf, write_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(process_commands(rx, path.clone(), write_timeout));

        Self { tx, path }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enqueue an entry for writing
    pub fn append(&self, entry: RoutingLogEntry) {
        if self.tx.send(LogCommand::Append(Box::new(entry))).is_err() {
            tracing::warn!(path = %self.path.display(), "routing log writer stopped, entry dropped");
        }
    }

    /// Wait until every previously enqueued entry has been handled
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(LogCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl std::fmt::Debug for RoutingLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingLog").field("path", &self.path).finish_non_exhaustive()
    }
}

async fn process_commands(mut rx: mpsc::UnboundedReceiver<LogCommand>, path: PathBuf, write_timeout: Duration) {
    let mut file = None;

    while let Some(command) = rx.recv().await {
        match command {
            LogCommand::Append(entry) => write_entry(&mut file, &path, &entry, write_timeout).await,
            LogCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    tracing::debug!("routing log writer shutting down");
}

async fn write_entry(file: &mut Option<File>, path: &Path, entry: &RoutingLogEntry, write_timeout: Duration) {
    let mut line = match serde_json::to_vec(entry) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, request_id = %entry.request_id, "failed to serialize routing log entry");
            return;
        }
    };
    line.push(b'\n');

    match tokio::time::timeout(write_timeout, append_line(file, path, &line)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, path = %path.display(), request_id = %entry.request_id, "failed to write routing log entry");
            *file = None;
        }
        Err(_) => {
            tracing::warn!(
                path = %path.display(),
                request_id = %entry.request_id,
                timeout_ms = write_timeout.as_millis(),
                "routing log write timed out"
            );
            *file = None;
        }
    }
}

async fn append_line(file: &mut Option<File>, path: &Path, line: &[u8]) -> std::io::Result<()> {
    if file.is_none() {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        *file = Some(OpenOptions::new().create(true).append(true).open(path).await?);
    }

    let Some(handle) = file.as_mut() else {
        return Ok(());
    };
    handle.write_all(line).await?;
    handle.flush().await
}

//! Failure sink: append-only record of URLs that failed to resolve
//!
//! The dispatcher records every failed query through a [`FailureSink`] as soon as the
//! failure is observed, so a crash part-way through a batch still leaves one entry
//! per failure seen so far.
//!
//! Two implementations are provided:
//!
//! - [`FileFailureSink`]: durable CSV-style log on disk (`url,timestamp` per line)
//! - [`MemoryFailureSink`]: in-process list, for tests and embedding

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{FailureRecord, Query};

/// Append-only destination for failed URLs
///
/// Implementations must serialize concurrent calls so that records never interleave,
/// and must never deduplicate: recording the same URL twice yields two entries.
#[async_trait]
pub trait FailureSink: Send + Sync {
    /// Append one record for `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be stored. Callers treat this as
    /// non-fatal.
    async fn record(&self, url: &Query) -> Result<()>;
}

/// Failure log backed by a file opened in append mode
///
/// The file (and its parent directories) is created on the first failure; an existing
/// file is never truncated. Each record is flushed and synced before `record` returns.
pub struct FileFailureSink {
    path: PathBuf,
    /// The lock also serializes appends
    state: Mutex<LogState>,
}

#[derive(Debug, Default)]
struct LogState {
    /// Opened lazily, dropped after a failed write
    file: Option<tokio::fs::File>,
    /// The last write may have left a partial line without its newline
    torn: bool,
}

impl FileFailureSink {
    /// Create a sink that appends to `path`
    ///
    /// Nothing touches the filesystem until the first failure is recorded.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(LogState::default()),
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> std::io::Result<tokio::fs::File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut state = self.state.lock().await;

        let mut file = match state.file.take() {
            Some(file) => file,
            None => self.open().await?,
        };
        // On error the handle is dropped here and reopened by the next append
        write_line(&mut file, line, &mut state.torn).await?;

        state.file.insert(file).sync_data().await
    }
}

/// Write one newline-terminated line, first terminating any torn line left behind
async fn write_line<W>(writer: &mut W, line: &str, torn: &mut bool) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if *torn {
        writer.write_all(b"\n").await?;
        *torn = false;
    }

    let written = async {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }
    .await;
    if written.is_err() {
        *torn = true;
    }
    written
}

impl std::fmt::Debug for FileFailureSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileFailureSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FailureSink for FileFailureSink {
    async fn record(&self, url: &Query) -> Result<()> {
        let mut line = FailureRecord::now(url.clone()).to_csv_line();
        line.push('\n');

        self.append(&line).await.map_err(|source| Error::FailureLog {
            path: self.path.clone(),
            source,
        })
    }
}

/// Failure sink that keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryFailureSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl MemoryFailureSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records, in append order
    pub async fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().await.clone()
    }

    /// URLs of all records, in append order
    pub async fn urls(&self) -> Vec<Query> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Returns true if nothing has been recorded
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl FailureSink for MemoryFailureSink {
    async fn record(&self, url: &Query) -> Result<()> {
        self.records
            .lock()
            .await
            .push(FailureRecord::now(url.clone()));
        Ok(())
    }
}

//! Local server log reader.
//!
//! The file is reopened on every read so a rotated log is picked up by
//! path. A file shorter than the cursor has been truncated or rotated and
//! is read again from the start.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use dinotrack_core::source::{LogChunk, LogReader, TransportError};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

/// Upper bound on bytes returned by one read. Anything beyond is picked up
/// on the next tick.
pub const MAX_READ_BYTES: u64 = 4_194_304;

/// Reads appended bytes from a log file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileLogReader {
    path: PathBuf,
}

impl FileLogReader {
    /// Create a reader for `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The tailed path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogReader for FileLogReader {
    async fn end_offset(&mut self) -> Result<u64, TransportError> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    async fn read_appended(&mut self, cursor: u64) -> Result<LogChunk, TransportError> {
        let mut file = File::open(&self.path).await?;
        let length = file.metadata().await?.len();

        let (start, rewound) = if length < cursor {
            (0, true)
        } else {
            (cursor, false)
        };
        file.seek(SeekFrom::Start(start)).await?;

        let pending = length.saturating_sub(start).min(MAX_READ_BYTES);
        let mut bytes = Vec::with_capacity(usize::try_from(pending).unwrap_or(0));
        file.take(MAX_READ_BYTES).read_to_end(&mut bytes).await?;

        let end = start.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
        let capped = end < length;
        debug!(
            path = %self.path.display(),
            start,
            end,
            rewound,
            capped,
            "Read appended log bytes"
        );
        Ok(LogChunk {
            bytes,
            start,
            end,
            rewound,
            capped,
        })
    }
}

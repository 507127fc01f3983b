//! Log-tail event source.
//!
//! Tracks a byte cursor into the server log. The first tick only records
//! the current end of the log as a baseline, so sessions that started
//! before the tracker did are not replayed. Every later tick reads what
//! was appended since the cursor and advances the cursor through the last
//! complete line.

use tracing::{info, warn};

use crate::parse::LogParser;
use crate::source::{EventBatch, LogReader, Observation, ObservationSource, SourceError};

/// Tails a [`LogReader`] and parses appended lines into events.
#[derive(Debug)]
pub struct EventTailSource<R> {
    reader: R,
    parser: LogParser,
    cursor: Option<u64>,
}

impl<R: LogReader> EventTailSource<R> {
    /// Create a source with no baseline yet.
    pub const fn new(reader: R, parser: LogParser) -> Self {
        Self {
            reader,
            parser,
            cursor: None,
        }
    }

    /// Byte offset the next read starts from, once a baseline exists.
    pub const fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    /// Release the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: LogReader> ObservationSource for EventTailSource<R> {
    fn name(&self) -> &'static str {
        "event_tail"
    }

    async fn observe(&mut self) -> Result<Observation, SourceError> {
        let Some(cursor) = self.cursor else {
            let baseline = self
                .reader
                .end_offset()
                .await
                .map_err(|source| SourceError::Transport {
                    operation: "establish log baseline",
                    source,
                })?;
            info!(offset = baseline, "Log baseline established");
            self.cursor = Some(baseline);
            return Ok(Observation::Events(EventBatch::default()));
        };

        let chunk = self
            .reader
            .read_appended(cursor)
            .await
            .map_err(|source| SourceError::Transport {
                operation: "read appended log",
                source,
            })?;

        if chunk.rewound {
            warn!(
                previous_cursor = cursor,
                log_len = chunk.end,
                "Log shorter than cursor, reading from the start"
            );
        }

        let parsed = self.parser.parse_chunk(chunk.start, &chunk.bytes);
        for mismatch in &parsed.mismatches {
            warn!(
                offset = mismatch.offset,
                line = %mismatch.line,
                "Join data line matched no known shape"
            );
        }
        let next = if parsed.consumed == 0 && chunk.capped && !chunk.bytes.is_empty() {
            warn!(
                start = chunk.start,
                end = chunk.end,
                "Read window holds no line break, skipping past it"
            );
            chunk.end
        } else {
            chunk.start.saturating_add(parsed.consumed)
        };
        self.cursor = Some(next);

        Ok(Observation::Events(EventBatch {
            events: parsed.events,
            mismatches: parsed.mismatches,
            rewound: chunk.rewound,
        }))
    }
}

//! Server log parsing for the event-tail source.
//!
//! Evrima writes player session changes under the `LogTheIsleJoinData`
//! category:
//!
//! ```text
//! [..]LogTheIsleJoinData: Rexy [76561198000000001] Joined The Server. Save file found Dino: BP_Carno_C, Gender: Male, Growth: 0.750000
//! [..]LogTheIsleJoinData: Rexy [76561198000000001] Joined The Server. Save file not found Dino: BP_Stego_C, Gender: Female, Growth: 0.250000
//! [..]LogTheIsleJoinData: Rexy [76561198000000001] Left The Server whilebeing safelogged, Was playing as: BP_Stego_C, Gender: Female, Growth: 0.260000
//! ```
//!
//! Parsing is pure: it turns bytes into typed [`LogEvent`]s and never
//! touches the roster. Lines without the join-data marker are other log
//! traffic and are skipped silently. Marker lines that match no known
//! shape become [`ParseMismatch`]es.

use dinotrack_types::{Gender, PlayerId};
use regex::{Captures, Regex};

/// Log category that carries join and leave lines.
pub const JOIN_DATA_MARKER: &str = "LogTheIsleJoinData";

const JOIN_PATTERN: &str = r"LogTheIsleJoinData: (?P<name>.*?) \[(?P<id>[^\]]+)\] Joined The Server\. Save file (?P<save>found|not found) Dino: (?P<class>[^,]*), Gender: (?P<gender>[^,]*), Growth: (?P<growth>\d+(?:\.\d+)?)";

const LEAVE_PATTERN: &str = r"LogTheIsleJoinData: (?P<name>.*?) \[(?P<id>[^\]]+)\] Left The Server.*?Was playing as: (?P<class>[^,]*), Gender: (?P<gender>[^,]*), Growth: (?P<growth>\d+(?:\.\d+)?)";

/// Which shape a log line had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEventKind {
    /// The player joined.
    Join {
        /// The server found a save for the creature.
        save_found: bool,
    },
    /// The player left.
    Leave,
}

/// One parsed join or leave line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Byte offset of the line start in the log.
    pub offset: u64,
    /// Join or leave.
    pub kind: LogEventKind,
    /// Player display name.
    pub display_name: String,
    /// Platform account id.
    pub player_id: PlayerId,
    /// Raw creature class name, not yet normalized.
    pub species_raw: String,
    /// Creature gender, when the token was recognized.
    pub gender: Option<Gender>,
    /// Growth in `[0.0, 1.0]`.
    pub growth: f32,
}

/// A join-data line that matched no known shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMismatch {
    /// Byte offset of the line start in the log.
    pub offset: u64,
    /// The offending line, carriage return stripped.
    pub line: String,
}

/// Result of parsing a run of bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedChunk {
    /// Events in log order.
    pub events: Vec<LogEvent>,
    /// Unrecognized join-data lines.
    pub mismatches: Vec<ParseMismatch>,
    /// Bytes consumed, always ending on a line boundary.
    pub consumed: u64,
}

/// Compiled join and leave patterns.
#[derive(Debug, Clone)]
pub struct LogParser {
    join: Regex,
    leave: Regex,
}

impl LogParser {
    /// Compile the line patterns.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            join: Regex::new(JOIN_PATTERN)?,
            leave: Regex::new(LEAVE_PATTERN)?,
        })
    }

    /// Parse one line.
    ///
    /// Returns `None` for lines outside the join-data category.
    pub fn parse_line(&self, offset: u64, line: &str) -> Option<Result<LogEvent, ParseMismatch>> {
        if !line.contains(JOIN_DATA_MARKER) {
            return None;
        }

        let parsed = if let Some(caps) = self.join.captures(line) {
            let save_found = caps.name("save").is_some_and(|m| m.as_str() == "found");
            event_from(offset, LogEventKind::Join { save_found }, &caps)
        } else if let Some(caps) = self.leave.captures(line) {
            event_from(offset, LogEventKind::Leave, &caps)
        } else {
            None
        };

        Some(parsed.ok_or_else(|| ParseMismatch {
            offset,
            line: line.to_owned(),
        }))
    }

    /// Parse every complete line in `bytes`, which start at log offset
    /// `start`.
    ///
    /// A trailing line without a newline is left unconsumed so the next
    /// read picks it up whole.
    pub fn parse_chunk(&self, start: u64, bytes: &[u8]) -> ParsedChunk {
        let mut parsed = ParsedChunk::default();
        let mut offset = start;

        for raw in bytes.split_inclusive(|byte| *byte == b'\n') {
            let Some(line) = raw.strip_suffix(b"\n") else {
                break;
            };
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let text = String::from_utf8_lossy(line);

            match self.parse_line(offset, &text) {
                Some(Ok(event)) => parsed.events.push(event),
                Some(Err(mismatch)) => parsed.mismatches.push(mismatch),
                None => {}
            }

            let width = u64::try_from(raw.len()).unwrap_or(u64::MAX);
            offset = offset.saturating_add(width);
            parsed.consumed = parsed.consumed.saturating_add(width);
        }

        parsed
    }
}

fn event_from(offset: u64, kind: LogEventKind, caps: &Captures<'_>) -> Option<LogEvent> {
    let player_id = PlayerId::new(caps.name("id")?.as_str());
    if player_id.is_empty() {
        return None;
    }
    let growth: f32 = caps.name("growth")?.as_str().parse().ok()?;

    Some(LogEvent {
        offset,
        kind,
        display_name: caps.name("name")?.as_str().trim().to_owned(),
        player_id,
        species_raw: caps.name("class")?.as_str().trim().to_owned(),
        gender: caps.name("gender").and_then(|m| Gender::parse(m.as_str())),
        growth: growth.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const JOIN_FOUND: &str = "[2024.06.01-18.22.41:117][412]LogTheIsleJoinData: Rexy [76561198000000001] Joined The Server. Save file found Dino: BP_Carno_C, Gender: Male, Growth: 0.750000";
    const JOIN_FRESH: &str = "[2024.06.01-18.22.41:117][412]LogTheIsleJoinData: Stomp [2] Joined The Server. Save file not found Dino: BP_Stego_C, Gender: Female, Growth: 0.250000";
    const LEAVE: &str = "[2024.06.01-19.01.02:001][998]LogTheIsleJoinData: Rexy [76561198000000001] Left The Server whilebeing safelogged, Was playing as: BP_Carno_C, Gender: Male, Growth: 0.760000";

    fn parser() -> LogParser {
        LogParser::new().unwrap()
    }

    #[test]
    fn parses_join_with_save() {
        let event = parser().parse_line(10, JOIN_FOUND).unwrap().unwrap();
        assert_eq!(event.offset, 10);
        assert_eq!(event.kind, LogEventKind::Join { save_found: true });
        assert_eq!(event.display_name, "Rexy");
        assert_eq!(event.player_id.as_str(), "76561198000000001");
        assert_eq!(event.species_raw, "BP_Carno_C");
        assert_eq!(event.gender, Some(Gender::Male));
        assert!((event.growth - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn parses_fresh_spawn_join() {
        let event = parser().parse_line(0, JOIN_FRESH).unwrap().unwrap();
        assert_eq!(event.kind, LogEventKind::Join { save_found: false });
        assert_eq!(event.gender, Some(Gender::Female));
        assert!((event.growth - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn parses_leave() {
        let event = parser().parse_line(0, LEAVE).unwrap().unwrap();
        assert_eq!(event.kind, LogEventKind::Leave);
        assert_eq!(event.species_raw, "BP_Carno_C");
        assert!((event.growth - 0.76).abs() < 1e-6);
    }

    #[test]
    fn names_with_brackets_survive() {
        let line = "LogTheIsleJoinData: [TAG] Rexy [42] Joined The Server. Save file found Dino: BP_Dilo_C, Gender: Male, Growth: 1.0";
        let event = parser().parse_line(0, line).unwrap().unwrap();
        assert_eq!(event.display_name, "[TAG] Rexy");
        assert_eq!(event.player_id.as_str(), "42");
    }

    #[test]
    fn other_categories_are_ignored() {
        assert!(
            parser()
                .parse_line(0, "[2024.06.01][1]LogTheIsleCharacter: something happened")
                .is_none()
        );
    }

    #[test]
    fn unrecognized_join_data_is_a_mismatch() {
        let line = "LogTheIsleJoinData: Rexy [1] did something new";
        let mismatch = parser().parse_line(5, line).unwrap().unwrap_err();
        assert_eq!(mismatch.offset, 5);
        assert_eq!(mismatch.line, line);
    }

    #[test]
    fn chunk_offsets_track_line_starts() {
        let text = format!("noise line\n{JOIN_FRESH}\r\n{LEAVE}\n");
        let parsed = parser().parse_chunk(100, text.as_bytes());
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.events.first().unwrap().offset, 111);
        let second = 111 + u64::try_from(JOIN_FRESH.len()).unwrap() + 2;
        assert_eq!(parsed.events.get(1).unwrap().offset, second);
        assert_eq!(parsed.consumed, u64::try_from(text.len()).unwrap());
        assert!(parsed.mismatches.is_empty());
    }

    #[test]
    fn partial_trailing_line_is_not_consumed() {
        let complete = format!("{JOIN_FOUND}\n");
        let text = format!("{complete}LogTheIsleJoinData: Half [9] Joi");
        let parsed = parser().parse_chunk(0, text.as_bytes());
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.consumed, u64::try_from(complete.len()).unwrap());
        assert!(parsed.mismatches.is_empty());
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut bytes = b"LogTheIsleJoinData: R\xffxy [3] Joined The Server. Save file found Dino: BP_Troodon_C, Gender: Female, Growth: 0.5\n".to_vec();
        bytes.extend_from_slice(b"\xfe\xfe\n");
        let parsed = parser().parse_chunk(0, &bytes);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events.first().unwrap().display_name, "R\u{fffd}xy");
    }
}

//! Parsers for Evrima RCON replies.
//!
//! Replies are plain text. The player list is a `PlayerList` header
//! followed by alternating id and name lines, each with a trailing comma.
//! Player data is a single comma-separated record.

use dinotrack_core::source::{DetailLookup, TransportError};
use dinotrack_types::{PlayerDetail, PlayerId, PlayerListing, Vitals};
use regex::Regex;
use tracing::debug;

/// Header line that opens a player-list reply.
pub const PLAYER_LIST_HEADER: &str = "PlayerList";

const PLAYER_DATA_PATTERN: &str = r"PlayerDataName: (?P<name>.*?), PlayerID: (?P<id>\d+), Location: .*?, Class: (?P<class>.*?), Growth: (?P<growth>[\d\.]+), Health: (?P<health>[\d\.]+), Stamina: (?P<stamina>[\d\.]+), Hunger: (?P<hunger>[\d\.]+), Thirst: (?P<thirst>[\d\.]+)";

/// Decode a raw reply, dropping NUL padding.
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "")
}

/// Parse a player-list reply.
///
/// # Errors
///
/// Returns [`TransportError::Protocol`] when the reply has no
/// `PlayerList` header. An empty list is only reported when the server
/// says so explicitly.
pub fn parse_player_list(reply: &str) -> Result<Vec<PlayerListing>, TransportError> {
    let mut lines = reply.lines().map(str::trim);
    if !lines.any(|line| line.contains(PLAYER_LIST_HEADER)) {
        return Err(TransportError::Protocol {
            message: format!("player list reply has no {PLAYER_LIST_HEADER} header"),
        });
    }

    let fields: Vec<String> = lines
        .map(|line| line.replace(',', "").trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect();

    let mut listings = Vec::with_capacity(fields.len() / 2);
    for pair in fields.chunks(2) {
        match pair {
            [id, name] => listings.push(PlayerListing {
                player_id: PlayerId::new(id),
                display_name: name.clone(),
            }),
            [dangling] => debug!(field = %dangling, "Player list ended with an unpaired id"),
            _ => {}
        }
    }
    Ok(listings)
}

/// Extracts [`PlayerDetail`] from player-data replies.
#[derive(Debug, Clone)]
pub struct PlayerDataParser {
    pattern: Regex,
}

impl PlayerDataParser {
    /// Compile the player-data pattern.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(PLAYER_DATA_PATTERN)?,
        })
    }

    /// Parse a player-data reply.
    ///
    /// A reply without a player-data record means the server has nothing
    /// for that name and yields [`DetailLookup::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Protocol`] when the record is present but a
    /// numeric field does not parse.
    pub fn parse(&self, reply: &str) -> Result<DetailLookup, TransportError> {
        let Some(caps) = self.pattern.captures(reply) else {
            return Ok(DetailLookup::NotFound);
        };

        let number = |field: &str| -> Result<f32, TransportError> {
            let raw = caps.name(field).map_or("", |m| m.as_str());
            raw.parse::<f32>().map_err(|e| TransportError::Protocol {
                message: format!("player data field {field} is not a number ({raw:?}): {e}"),
            })
        };

        Ok(DetailLookup::Found(PlayerDetail {
            species_raw: caps
                .name("class")
                .map_or_else(String::new, |m| m.as_str().trim().to_owned()),
            growth: number("growth")?.clamp(0.0, 1.0),
            gender: None,
            vitals: Some(Vitals {
                health: number("health")?,
                stamina: number("stamina")?,
                hunger: number("hunger")?,
                thirst: number("thirst")?,
            }),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const DATA: &str = "PlayerDataName: Rexy, PlayerID: 76561198000000001, Location: X=1.0 Y=2.0 Z=3.0, Class: BP_Carno_C, Growth: 0.75, Health: 0.9, Stamina: 1.0, Hunger: 0.5, Thirst: 0.25";

    #[test]
    fn player_list_pairs_ids_with_names() {
        let reply = "PlayerList\n76561198000000001,\nRexy,\n76561198000000002,\nStomp,\n";
        let listings = parse_player_list(reply).unwrap();
        assert_eq!(
            listings,
            vec![
                PlayerListing {
                    player_id: PlayerId::new("76561198000000001"),
                    display_name: String::from("Rexy"),
                },
                PlayerListing {
                    player_id: PlayerId::new("76561198000000002"),
                    display_name: String::from("Stomp"),
                },
            ]
        );
    }

    #[test]
    fn empty_player_list() {
        assert!(parse_player_list("PlayerList\n").unwrap().is_empty());
    }

    #[test]
    fn reply_without_header_is_a_protocol_error() {
        assert!(matches!(
            parse_player_list("Command not recognised"),
            Err(TransportError::Protocol { .. })
        ));
    }

    #[test]
    fn unpaired_trailing_id_is_dropped() {
        let listings = parse_player_list("PlayerList\n1,\nRexy,\n2,\n").unwrap();
        assert_eq!(listings.len(), 1);
    }

    #[test]
    fn decode_strips_nul_padding() {
        assert_eq!(decode(b"PlayerList\n\0\0"), "PlayerList\n");
    }

    #[test]
    fn player_data_is_extracted() {
        let parser = PlayerDataParser::new().unwrap();
        let DetailLookup::Found(detail) = parser.parse(DATA).unwrap() else {
            panic!("expected a detail record");
        };
        assert_eq!(detail.species_raw, "BP_Carno_C");
        assert!((detail.growth - 0.75).abs() < f32::EPSILON);
        assert!(detail.gender.is_none());
        let vitals = detail.vitals.unwrap();
        assert!((vitals.thirst - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_player_is_not_found() {
        let parser = PlayerDataParser::new().unwrap();
        assert_eq!(
            parser.parse("Player not found").unwrap(),
            DetailLookup::NotFound
        );
    }

    #[test]
    fn malformed_number_is_a_protocol_error() {
        let parser = PlayerDataParser::new().unwrap();
        let reply = DATA.replace("Growth: 0.75", "Growth: 0.7.5");
        assert!(matches!(
            parser.parse(&reply),
            Err(TransportError::Protocol { .. })
        ));
    }
}

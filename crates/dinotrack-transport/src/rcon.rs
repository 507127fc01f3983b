//! Evrima RCON client.
//!
//! Frames are a type byte, an optional opcode, a UTF-8 payload and a NUL
//! terminator:
//!
//! ```text
//! login:   0x01 <password> 0x00
//! command: 0x02 <opcode> <payload> 0x00
//! ```
//!
//! Replies carry no length prefix. A reply is read until the server has
//! been quiet for the configured response gap. The session is opened on
//! the first command and dropped after any failure, so the next command
//! logs in again.

use std::time::Duration;

use dinotrack_core::config::RconConfig;
use dinotrack_core::source::{DetailLookup, PlayerQuery, TransportError};
use dinotrack_types::PlayerListing;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::response::{decode, parse_player_list, PlayerDataParser};

/// Frame type byte for a login.
pub const FRAME_LOGIN: u8 = 0x01;
/// Frame type byte for a command.
pub const FRAME_COMMAND: u8 = 0x02;
/// Opcode: list connected players.
pub const OP_GET_PLAYER_LIST: u8 = 0x40;
/// Opcode: describe one player by display name.
pub const OP_GET_PLAYER_DATA: u8 = 0x77;

/// Login replies containing this are successful.
const LOGIN_ACCEPTED: &str = "Accepted";

const READ_CHUNK: usize = 8192;
const MAX_REPLY_BYTES: usize = 1_048_576;

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Encode a login frame.
pub fn login_frame(password: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(password.len().saturating_add(2));
    frame.push(FRAME_LOGIN);
    frame.extend_from_slice(password.as_bytes());
    frame.push(0x00);
    frame
}

/// Encode a command frame.
pub fn command_frame(opcode: u8, payload: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len().saturating_add(3));
    frame.push(FRAME_COMMAND);
    frame.push(opcode);
    frame.extend_from_slice(payload.as_bytes());
    frame.push(0x00);
    frame
}

/// Read one reply: block for the first bytes, then keep reading until the
/// server is quiet for `gap` or the reply reaches the size cap.
async fn read_reply(stream: &mut TcpStream, gap: Duration) -> Result<Vec<u8>, TransportError> {
    let mut reply = Vec::new();
    let mut chunk = vec![0_u8; READ_CHUNK];

    let read = stream.read(&mut chunk).await?;
    if read == 0 {
        return Err(TransportError::Io {
            source: std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
        });
    }
    reply.extend_from_slice(chunk.get(..read).unwrap_or_default());

    while reply.len() < MAX_REPLY_BYTES {
        match tokio::time::timeout(gap, stream.read(&mut chunk)).await {
            Err(_) | Ok(Ok(0)) => break,
            Ok(Ok(read)) => reply.extend_from_slice(chunk.get(..read).unwrap_or_default()),
            Ok(Err(error)) => return Err(error.into()),
        }
    }
    Ok(reply)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A lazily connected RCON session.
pub struct RconClient {
    address: String,
    password: String,
    response_gap: Duration,
    parser: PlayerDataParser,
    stream: Option<TcpStream>,
}

impl RconClient {
    /// Create a client. No connection is made until the first command.
    pub fn new(config: &RconConfig, parser: PlayerDataParser) -> Self {
        Self {
            address: config.address(),
            password: config.password.clone(),
            response_gap: Duration::from_millis(config.response_gap_ms),
            parser,
            stream: None,
        }
    }

    /// Address the client dials.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether a logged-in session is currently held.
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop the current session, if any.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!(address = %self.address, "RCON session dropped");
        }
    }

    /// Send one command and return the decoded reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if connecting, logging in, writing, or
    /// reading fails. The session is dropped in every such case.
    pub async fn command(&mut self, opcode: u8, payload: &str) -> Result<String, TransportError> {
        let result = self.exchange(&command_frame(opcode, payload)).await;
        if let Err(error) = &result {
            debug!(
                address = %self.address,
                opcode,
                error = %error,
                "RCON command failed"
            );
            self.disconnect();
        }
        result
    }

    async fn exchange(&mut self, frame: &[u8]) -> Result<String, TransportError> {
        let gap = self.response_gap;
        let stream = self.session().await?;
        stream.write_all(frame).await?;
        let reply = read_reply(stream, gap).await?;
        Ok(decode(&reply))
    }

    /// The held session, logging in first if there is none.
    async fn session(&mut self) -> Result<&mut TcpStream, TransportError> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.login().await?,
        };
        Ok(self.stream.insert(stream))
    }

    async fn login(&self) -> Result<TcpStream, TransportError> {
        let mut stream =
            TcpStream::connect(&self.address)
                .await
                .map_err(|source| TransportError::Connect {
                    address: self.address.clone(),
                    source,
                })?;

        stream.write_all(&login_frame(&self.password)).await?;
        let reply = decode(&read_reply(&mut stream, self.response_gap).await?);
        if !reply.contains(LOGIN_ACCEPTED) {
            return Err(TransportError::Auth {
                message: reply.trim().to_owned(),
            });
        }

        info!(address = %self.address, "RCON session established");
        Ok(stream)
    }
}

impl core::fmt::Debug for RconClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RconClient")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("response_gap", &self.response_gap)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl PlayerQuery for RconClient {
    async fn fetch_player_list(&mut self) -> Result<Vec<PlayerListing>, TransportError> {
        let reply = self.command(OP_GET_PLAYER_LIST, "").await?;
        parse_player_list(&reply)
    }

    async fn fetch_player_detail(
        &mut self,
        display_name: &str,
    ) -> Result<DetailLookup, TransportError> {
        let reply = self.command(OP_GET_PLAYER_DATA, display_name).await?;
        self.parser.parse(&reply)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_frame_layout() {
        assert_eq!(login_frame("pw"), vec![0x01, b'p', b'w', 0x00]);
    }

    #[test]
    fn player_list_frame_has_no_payload() {
        assert_eq!(command_frame(OP_GET_PLAYER_LIST, ""), vec![0x02, 0x40, 0x00]);
    }

    #[test]
    fn player_data_frame_carries_name() {
        assert_eq!(
            command_frame(OP_GET_PLAYER_DATA, "Rexy"),
            vec![0x02, 0x77, b'R', b'e', b'x', b'y', 0x00]
        );
    }

    #[test]
    fn new_client_is_not_connected_and_hides_password() {
        let config = RconConfig {
            password: String::from("hunter2"),
            ..RconConfig::default()
        };
        let client = RconClient::new(&config, PlayerDataParser::new().unwrap());
        assert!(!client.is_connected());
        assert_eq!(client.address(), "127.0.0.1:8888");
        assert!(!format!("{client:?}").contains("hunter2"));
    }
}

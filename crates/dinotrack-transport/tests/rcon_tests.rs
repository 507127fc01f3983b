//! RCON client against a scripted loopback server.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;
use std::sync::Arc;

use dinotrack_census::{KnownSpeciesCatalog, NameNormalizer};
use dinotrack_core::config::RconConfig;
use dinotrack_core::reconciler::{Reconciler, ReconcilerSettings};
use dinotrack_core::scheduler::Tracker;
use dinotrack_core::snapshot::SnapshotSource;
use dinotrack_core::source::{DetailLookup, PlayerQuery, TransportError};
use dinotrack_transport::{PlayerDataParser, RconClient};
use dinotrack_types::{ChangeRecord, PlayerId};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

const PASSWORD: &str = "hunter2";

/// What the scripted server knows: id -> (name, class).
type Players = Arc<Mutex<BTreeMap<String, (String, String)>>>;

struct FakeServer {
    port: u16,
    players: Players,
    logins: Arc<Mutex<u32>>,
}

/// Start a server that hangs up after `commands_per_session` commands.
async fn start(commands_per_session: usize) -> FakeServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let players: Players = Arc::default();
    let logins = Arc::new(Mutex::new(0));

    let (shared_players, shared_logins) = (Arc::clone(&players), Arc::clone(&logins));
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let players = Arc::clone(&shared_players);
            let logins = Arc::clone(&shared_logins);
            tokio::spawn(serve(socket, players, logins, commands_per_session));
        }
    });

    FakeServer {
        port,
        players,
        logins,
    }
}

async fn serve(
    mut socket: TcpStream,
    players: Players,
    logins: Arc<Mutex<u32>>,
    commands_per_session: usize,
) {
    let mut buf = vec![0_u8; 1024];

    let read = socket.read(&mut buf).await.unwrap_or(0);
    let frame = &buf[..read];
    let accepted = frame.first() == Some(&0x01)
        && frame.get(1..read.saturating_sub(1)) == Some(PASSWORD.as_bytes());
    if !accepted {
        let _ = socket.write_all(b"Password Rejected").await;
        return;
    }
    *logins.lock().await += 1;
    let _ = socket.write_all(b"Password Accepted").await;

    for _ in 0..commands_per_session {
        let read = socket.read(&mut buf).await.unwrap_or(0);
        if read < 3 {
            return;
        }
        let opcode = buf[1];
        let payload = String::from_utf8_lossy(&buf[2..read - 1]).into_owned();
        let players = players.lock().await;
        let reply = match opcode {
            0x40 => {
                let mut reply = String::from("PlayerList\n");
                for (id, (name, _)) in players.iter() {
                    reply.push_str(&format!("{id},\n{name},\n"));
                }
                reply
            }
            0x77 => players
                .iter()
                .find(|(_, (name, _))| *name == payload)
                .map_or_else(
                    || String::from("Player not found"),
                    |(id, (name, class))| {
                        format!(
                            "PlayerDataName: {name}, PlayerID: {id}, Location: X=0 Y=0 Z=0, Class: {class}, Growth: 0.5, Health: 1.0, Stamina: 1.0, Hunger: 1.0, Thirst: 1.0"
                        )
                    },
                ),
            _ => String::from("Unknown command"),
        };
        drop(players);
        if socket.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn client(port: u16, password: &str) -> RconClient {
    let config = RconConfig {
        host: String::from("127.0.0.1"),
        port,
        password: password.to_owned(),
        response_gap_ms: 20,
    };
    RconClient::new(&config, PlayerDataParser::new().unwrap())
}

#[tokio::test]
async fn lists_players_and_fetches_detail() {
    let server = start(usize::MAX).await;
    server.players.lock().await.insert(
        String::from("76561198000000001"),
        (String::from("Rexy"), String::from("BP_Carno_C")),
    );
    let mut client = client(server.port, PASSWORD);

    let listings = client.fetch_player_list().await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].display_name, "Rexy");
    assert!(client.is_connected());

    match client.fetch_player_detail("Rexy").await.unwrap() {
        DetailLookup::Found(detail) => assert_eq!(detail.species_raw, "BP_Carno_C"),
        DetailLookup::NotFound => panic!("expected detail"),
    }
    assert_eq!(
        client.fetch_player_detail("Nobody").await.unwrap(),
        DetailLookup::NotFound
    );
    assert_eq!(*server.logins.lock().await, 1);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let server = start(usize::MAX).await;
    let mut client = client(server.port, "wrong");

    let error = client.fetch_player_list().await.unwrap_err();
    assert!(matches!(error, TransportError::Auth { .. }));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let error = client(port, PASSWORD).fetch_player_list().await.unwrap_err();
    assert!(matches!(error, TransportError::Connect { .. }));
}

#[tokio::test]
async fn dropped_session_reconnects_on_next_command() {
    let server = start(1).await;
    let mut client = client(server.port, PASSWORD);

    assert!(client.fetch_player_list().await.is_ok());
    assert!(client.fetch_player_list().await.is_err());
    assert!(!client.is_connected());
    assert!(client.fetch_player_list().await.is_ok());
    assert_eq!(*server.logins.lock().await, 2);
}

#[tokio::test]
async fn snapshot_tick_over_rcon() {
    let server = start(usize::MAX).await;
    {
        let mut players = server.players.lock().await;
        players.insert(
            String::from("1"),
            (String::from("Rexy"), String::from("BP_Carno_C")),
        );
        players.insert(
            String::from("2"),
            (String::from("Stomp"), String::from("BP_Stego_C")),
        );
    }

    let tracker = Tracker::new(Reconciler::new(
        NameNormalizer::new(Arc::new(KnownSpeciesCatalog::builtin())),
        ReconcilerSettings::default(),
    ));
    let mut source = SnapshotSource::new(client(server.port, PASSWORD));

    let report = tracker.tick(&mut source).await.unwrap();
    assert_eq!(report.changes.len(), 2);

    server.players.lock().await.remove("2");
    let report = tracker.tick(&mut source).await.unwrap();
    match report.changes.as_slice() {
        [ChangeRecord::Left { player_id, species, .. }] => {
            assert_eq!(*player_id, PlayerId::new("2"));
            assert_eq!(species, "Stegosaurus");
        }
        other => panic!("unexpected changes: {other:?}"),
    }

    let view = tracker.view();
    let view = view.read().await;
    assert_eq!(view.census.get("Carnotaurus"), 1);
    assert_eq!(view.census.get("Stegosaurus"), 0);
}

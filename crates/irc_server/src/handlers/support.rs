//! Shared scaffolding for handler-level dispatch tests: a bare `ServerState`
//! and a mailbox-backed connection, so tests can drive `dispatch` the same
//! way the listener does and assert on the reply sequence.

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::config::Config;
use crate::message::Message;
use crate::server::ServerState;
use crate::sink::Sink;
use crate::users::UserKey;

pub fn test_server() -> ServerState {
    ServerState::new(Config {
        port: 6667,
        hostname: "irc.test".to_string(),
        motd: None,
        password: None,
        network_name: None,
        network_created_on: None,
        version: "test".to_string(),
    })
}

/// Accept a connection the way the listener would, minus the real socket.
pub fn connect(server: &ServerState) -> (UserKey, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(64);
    let key = server
        .users()
        .connect("host".to_string(), Sink::Tcp(tx, Arc::new(Notify::new())));
    (key, rx)
}

/// Run the NICK/USER handshake so `key` is registered.
pub async fn register(server: &ServerState, key: &UserKey, nick: &str) {
    super::dispatch(server, key, &format!("NICK {nick}")).await;
    super::dispatch(server, key, &format!("USER {nick} 0 * :{nick} Real")).await;
}

/// Drain every reply currently queued without waiting for more.
pub fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

//! C6: the per-connection state machine. Grounded on the teacher's
//! reader/writer task split (`handlers/client.rs`), simplified because
//! channel fan-out here goes straight through each member's `Sink` rather
//! than a second broadcast/subscribe layer — the writer task only has to
//! drain its own mailbox.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};

use crate::handlers;
use crate::server::ServerState;
use crate::sink::Sink;

const OUTBOUND_CHANNEL_SIZE: usize = 32;

/// Drive one accepted TCP connection start to finish: eager user creation,
/// line framing, dispatch, and cleanup on disconnect (§4.6). The user's
/// hostname is resolved from the peer address, not the server's own.
pub async fn handle_connection(socket: TcpStream, addr: SocketAddr, server: ServerState) {
    let (tx_outbound, rx_outbound) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
    let shutdown = Arc::new(Notify::new());
    let hostname = addr.ip().to_string();
    let key = server
        .users()
        .connect(hostname, Sink::Tcp(tx_outbound, shutdown.clone()));
    info!("connection accepted, assigned key {key}");

    let (read_half, write_half) = io::split(socket);
    let writer_task = tokio::spawn(writer_loop(write_half, rx_outbound));
    reader_loop(read_half, &key, &server, &shutdown).await;

    server.users().remove(&key, None, server.channels()).await;
    writer_task.abort();
}

async fn reader_loop(
    reader: tokio::io::ReadHalf<TcpStream>,
    key: &String,
    server: &ServerState,
    shutdown: &Notify,
) {
    let mut reader = tokio::io::BufReader::new(reader);
    let mut line = String::new();
    loop {
        line.clear();
        tokio::select! {
            result = reader.read_line(&mut line) => {
                match result {
                    Ok(0) => {
                        debug!("[{key}] connection closed by peer");
                        break;
                    }
                    Err(err) => {
                        warn!("[{key}] read error: {err}");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(['\r', '\n']);
                        if !trimmed.is_empty() {
                            handlers::dispatch(server, key, trimmed).await;
                        }
                    }
                }
            }
            _ = shutdown.notified() => {
                debug!("[{key}] shutdown requested, closing connection");
                break;
            }
        }
    }
}

async fn writer_loop(
    mut writer: tokio::io::WriteHalf<TcpStream>,
    mut rx_outbound: mpsc::Receiver<crate::message::Message>,
) {
    while let Some(msg) = rx_outbound.recv().await {
        if let Err(err) = writer.write_all(msg.into_wire().as_bytes()).await {
            warn!("write error, closing connection: {err}");
            break;
        }
    }
}

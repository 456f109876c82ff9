//! §9: a sum type unifying delivery to dissimilar endpoints — a TCP
//! connection's outbound queue, an in-process virtual user's mailbox, and
//! a no-op sink for observers — behind one `deliver` call.

use std::sync::Arc;

use log::warn;
use tokio::sync::{mpsc, Notify};

use crate::message::Message;

#[derive(Debug, Clone)]
pub enum Sink {
    /// A native TCP client; messages are queued for its writer task. The
    /// `Notify` lets `UserRegistry::remove` tell the listener's reader task
    /// to stop blocking on the socket and tear the connection down.
    Tcp(mpsc::Sender<Message>, Arc<Notify>),
    /// An in-process virtual participant; messages are queued onto the
    /// mailbox the host reads from.
    Mailbox(mpsc::Sender<Message>),
    /// Sink-less: messages addressed here are silently dropped.
    Void,
}

impl Sink {
    /// Deliver one message. A closed receiver is logged and otherwise
    /// ignored — one dead sink must never abort a broadcast to others.
    pub async fn deliver(&self, msg: Message) {
        match self {
            Sink::Tcp(tx, _) | Sink::Mailbox(tx) => {
                if tx.send(msg).await.is_err() {
                    warn!("sink closed, dropping message");
                }
            }
            Sink::Void => {}
        }
    }

    /// §4.4 quit/remove: "(if irc) closes the connection" — wake the
    /// listener's reader task so it stops blocking on the socket.
    pub fn close(&self) {
        if let Sink::Tcp(_, shutdown) = self {
            shutdown.notify_one();
        }
    }
}

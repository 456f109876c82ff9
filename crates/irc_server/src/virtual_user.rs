//! §6 Virtual-user API: the surface host applications use to expose
//! internal services as IRC participants sharing channels with native TCP
//! clients.

use tokio::sync::mpsc;

use crate::errors::ValidationError;
use crate::message::Message;
use crate::server::ServerState;
use crate::sink::Sink;
use crate::users::UserKey;

/// A mailbox the host reads virtual-user deliveries from.
pub type Mailbox = mpsc::Receiver<Message>;

pub struct VirtualUserSpec {
    pub key: UserKey,
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub hostname: String,
}

/// Register a virtual user and get back the mailbox it will receive
/// messages on. `void` participants (no mailbox) should deliver through
/// `register_void` instead.
pub fn register_virtual(
    server: &ServerState,
    spec: VirtualUserSpec,
) -> Result<Mailbox, ValidationError> {
    let (tx, rx) = mpsc::channel(64);
    server.users().register_virtual(
        spec.key,
        spec.nick,
        spec.username,
        spec.realname,
        spec.hostname,
        Sink::Mailbox(tx),
    )?;
    Ok(rx)
}

/// Register a sink-less observer: messages addressed to it are dropped.
pub fn register_void(server: &ServerState, spec: VirtualUserSpec) -> Result<(), ValidationError> {
    server
        .users()
        .register_virtual(
            spec.key,
            spec.nick,
            spec.username,
            spec.realname,
            spec.hostname,
            Sink::Void,
        )
        .map(|_| ())
}

/// Send a PRIVMSG as a registered virtual user to a nick or a channel.
pub async fn send_privmsg(
    server: &ServerState,
    from: &UserKey,
    target: &str,
    text: &str,
) -> Result<(), ValidationError> {
    let sender = server.users().get(from).ok_or(ValidationError::NoSuchUser)?;
    let msg = Message::new("PRIVMSG")
        .with_prefix(sender.ident())
        .with_middle(target.to_string())
        .with_trailing(text.to_string());

    if let Some(channel) = target.strip_prefix('#') {
        let channel = format!("#{channel}");
        if server.channels().get(&channel).is_none() {
            return Err(ValidationError::NoSuchChannel);
        }
        server
            .channels()
            .broadcast_excluding(server.users(), &channel, from, msg)
            .await;
    } else {
        let recipient = server
            .users()
            .find_by_nick(target)
            .ok_or(ValidationError::NoSuchUser)?;
        server.users().send(&recipient.key, msg).await;
    }
    Ok(())
}

/// Unregister a virtual user: identical cleanup to a native client's QUIT.
pub async fn unregister(server: &ServerState, key: &UserKey, reason: Option<String>) {
    server.users().remove(key, reason, server.channels()).await;
}

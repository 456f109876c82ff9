//! C4: the user entity and the registry operations built on top of it —
//! registration, nick changes, unified send/broadcast over heterogeneous
//! sinks, and quit/remove cleanup (§4.4).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::channels::ChannelRegistry;
use crate::errors::ValidationError;
use crate::grammar::is_valid_nick_syntax;
use crate::message::Message;
use crate::registry::Registry;
use crate::sink::Sink;

pub type UserKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserKind {
    Irc,
    Virtual,
    Void,
}

#[derive(Debug, Clone)]
pub struct User {
    pub key: UserKey,
    pub kind: UserKind,
    pub nick: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub hostname: Option<String>,
    pub channels: HashSet<String>,
    pub modes: HashSet<char>,
    pub pass_ok: bool,
    pub sink: Sink,
}

impl User {
    fn new(key: UserKey, kind: UserKind, hostname: String, sink: Sink) -> Self {
        User {
            key,
            kind,
            nick: None,
            username: None,
            realname: None,
            hostname: Some(hostname),
            channels: HashSet::new(),
            modes: HashSet::new(),
            pass_ok: false,
            sink,
        }
    }

    /// I5: fully registered iff nick/username/realname/hostname are all
    /// set and, when a server password is configured, `pass_ok` is true.
    pub fn is_registered(&self, password_required: bool) -> bool {
        self.nick.is_some()
            && self.username.is_some()
            && self.realname.is_some()
            && self.hostname.is_some()
            && (!password_required || self.pass_ok)
    }

    /// `nick!~<first 8 chars of username>@hostname`
    pub fn ident(&self) -> String {
        let nick = self.nick.as_deref().unwrap_or("*");
        let username: String = self.username.as_deref().unwrap_or("").chars().take(8).collect();
        let hostname = self.hostname.as_deref().unwrap_or("*");
        format!("{nick}!~{username}@{hostname}")
    }
}

/// Registry of all users, TCP-backed and virtual alike.
#[derive(Debug)]
pub struct UserRegistry {
    registry: Registry<UserKey, User>,
    next_conn_id: AtomicU64,
}

impl UserRegistry {
    pub fn new() -> Self {
        UserRegistry {
            registry: Registry::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// §4.6: eager creation the instant a new TCP connection is accepted,
    /// with only `key`/`sink`/`hostname` populated.
    pub fn connect(&self, hostname: String, sink: Sink) -> UserKey {
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let key = format!("conn:{id}");
        let user = User::new(key.clone(), UserKind::Irc, hostname, sink);
        // Fresh connection ids are never reused while live, so `set` always succeeds.
        self.registry.set(key.clone(), user);
        key
    }

    pub fn get(&self, key: &UserKey) -> Option<User> {
        self.registry.get(key)
    }

    pub fn is_registered(&self, key: &UserKey, password_required: bool) -> bool {
        self.registry
            .get(key)
            .map(|u| u.is_registered(password_required))
            .unwrap_or(false)
    }

    /// O(n) full scan, per §9 — the spec does not require a secondary
    /// index, only unique-nick enforcement.
    pub fn find_by_nick(&self, nick: &str) -> Option<User> {
        self.registry
            .dump()
            .into_iter()
            .map(|(_, u)| u)
            .find(|u| u.nick.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(nick)))
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.registry
            .dump()
            .into_iter()
            .map(|(_, u)| u)
            .find(|u| u.username.as_deref() == Some(username))
    }

    pub fn set_pass_ok(&self, key: &UserKey) {
        self.registry.alter(key, |u| u.pass_ok = true);
    }

    /// USER command: set username/realname/hostname. §4.4/§4.7: a second
    /// USER claiming a username already held by another registered user
    /// is rejected.
    pub fn set_user_details(
        &self,
        key: &UserKey,
        username: String,
        realname: String,
        hostname: String,
    ) -> Result<(), ValidationError> {
        if self
            .find_by_username(&username)
            .is_some_and(|existing| existing.key != *key)
        {
            return Err(ValidationError::AlreadyRegistered);
        }
        if self.registry.alter(key, |u| {
            u.username = Some(username);
            u.realname = Some(realname);
            u.hostname = Some(hostname);
        }) {
            Ok(())
        } else {
            Err(ValidationError::NoSuchUser)
        }
    }

    /// §4.4 change_nick: validate, check collision, broadcast the NICK
    /// notification to the user and every channel they're in *before*
    /// the registry record itself is updated, then update it.
    pub async fn change_nick(
        &self,
        key: &UserKey,
        new_nick: &str,
        channels: &ChannelRegistry,
    ) -> Result<(), ValidationError> {
        if !is_valid_nick_syntax(new_nick) {
            return Err(ValidationError::ErroneousNick);
        }
        if self
            .find_by_nick(new_nick)
            .is_some_and(|existing| existing.key != *key)
        {
            return Err(ValidationError::NickInUse);
        }
        let user = self.registry.get(key).ok_or(ValidationError::NoSuchUser)?;
        if user.nick.is_some() {
            let notice = Message::new("NICK")
                .with_prefix(user.ident())
                .with_middle(new_nick.to_string());
            self.send(key, notice.clone()).await;
            for channel in &user.channels {
                channels.broadcast(self, channel, notice.clone()).await;
            }
        }
        self.registry.alter(key, |u| u.nick = Some(new_nick.to_string()));
        Ok(())
    }

    /// §6 virtual-user registration: the full `add` contract of §4.4 in
    /// one shot, since virtual users skip the handshake entirely.
    pub fn register_virtual(
        &self,
        key: UserKey,
        nick: String,
        username: String,
        realname: String,
        hostname: String,
        sink: Sink,
    ) -> Result<UserKey, ValidationError> {
        if nick.is_empty() || username.is_empty() || realname.is_empty() || hostname.is_empty() {
            return Err(ValidationError::NeedMoreParams);
        }
        if !matches!(sink, Sink::Mailbox(_) | Sink::Void) {
            return Err(ValidationError::InvalidSink);
        }
        if !is_valid_nick_syntax(&nick) {
            return Err(ValidationError::ErroneousNick);
        }
        if self.find_by_nick(&nick).is_some() {
            return Err(ValidationError::NickInUse);
        }
        if self.find_by_username(&username).is_some() {
            return Err(ValidationError::AlreadyRegistered);
        }
        let kind = if matches!(sink, Sink::Void) {
            UserKind::Void
        } else {
            UserKind::Virtual
        };
        let mut user = User::new(key.clone(), kind, hostname, sink);
        user.nick = Some(nick);
        user.username = Some(username);
        user.realname = Some(realname);
        if self.registry.set(key.clone(), user) {
            Ok(key)
        } else {
            Err(ValidationError::KeyInUse)
        }
    }

    pub async fn send(&self, key: &UserKey, msg: Message) {
        if let Some(user) = self.registry.get(key) {
            user.sink.deliver(msg).await;
        }
    }

    /// Send to the user and to every channel they belong to.
    pub async fn broadcast(&self, key: &UserKey, msg: Message, channels: &ChannelRegistry) {
        self.send(key, msg.clone()).await;
        if let Some(user) = self.registry.get(key) {
            for channel in &user.channels {
                channels.broadcast(self, channel, msg.clone()).await;
            }
        }
    }

    pub fn ident_for(&self, key: &UserKey) -> Option<String> {
        self.registry.get(key).map(|u| u.ident())
    }

    /// MODE (§4.7): add or remove each letter from the user's mode set.
    pub fn apply_modes(&self, key: &UserKey, add: bool, letters: &str) -> bool {
        self.registry.alter(key, |u| {
            for c in letters.chars() {
                if add {
                    u.modes.insert(c);
                } else {
                    u.modes.remove(&c);
                }
            }
        })
    }

    pub(crate) fn join_channel(&self, key: &UserKey, channel: &str) {
        self.registry.alter(key, |u| {
            u.channels.insert(channel.to_string());
        });
    }

    pub(crate) fn leave_channel(&self, key: &UserKey, channel: &str) {
        self.registry.alter(key, |u| {
            u.channels.remove(channel);
        });
    }

    /// §4.4 quit/remove: part every channel (each broadcasting `PART`
    /// first), destroy the user record, then (if irc) close the connection.
    pub async fn remove(&self, key: &UserKey, reason: Option<String>, channels: &ChannelRegistry) {
        let Some(user) = self.registry.get(key) else {
            return;
        };
        for channel in user.channels.clone() {
            let _ = channels
                .remove_user(self, &channel, key, reason.clone())
                .await;
        }
        self.registry.remove(key);
        user.sink.close();
    }
}

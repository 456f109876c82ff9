//! C5: the channel entity and the registry operations built on top of it —
//! membership mutation, topic management, and broadcast fan-out (§4.5).
//!
//! Broadcast fans out by walking `Channel::users` and delivering through
//! each member's own `Sink` (registry-backed), rather than a second
//! publish/subscribe primitive: every member's delivery path already goes
//! through `UserRegistry::send`, so a channel broadcast is just that,
//! looped.

use std::collections::HashSet;

use crate::errors::ValidationError;
use crate::grammar::is_valid_channel_name;
use crate::message::Message;
use crate::registry::Registry;
use crate::users::{UserKey, UserKind, UserRegistry};

pub type ChannelName = String;

#[derive(Debug, Clone)]
pub struct Channel {
    pub name: ChannelName,
    pub topic: String,
    pub users: HashSet<UserKey>,
    /// §3: user-type tags whose members actually receive broadcasts.
    pub relay_to: HashSet<UserKind>,
}

impl Channel {
    fn new(name: &str) -> Self {
        Channel {
            name: name.to_string(),
            topic: String::new(),
            users: HashSet::new(),
            relay_to: HashSet::from([UserKind::Irc, UserKind::Virtual]),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChannelRegistry {
    registry: Registry<ChannelName, Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        ChannelRegistry {
            registry: Registry::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Channel> {
        self.registry.get(&name.to_string())
    }

    pub fn dump(&self) -> Vec<(ChannelName, Channel)> {
        self.registry.dump()
    }

    /// §4.5 add_user: create the channel lazily if it doesn't exist,
    /// idempotently add the member, then broadcast `JOIN` (the joiner is
    /// included in the broadcast). Channel-registry mutation happens
    /// before user-registry mutation throughout this module — a fixed
    /// lock-ordering policy that keeps the two sides of the bidirectional
    /// membership invariant (I3/C3) from deadlocking against each other.
    pub async fn add_user(
        &self,
        users: &UserRegistry,
        name: &str,
        key: &UserKey,
    ) -> Result<Channel, ValidationError> {
        if !is_valid_channel_name(name) {
            return Err(ValidationError::NoSuchChannel);
        }
        let user = users.get(key).ok_or(ValidationError::NoSuchUser)?;
        let updated = self.registry.alter_or_insert(
            name.to_string(),
            || Channel::new(name),
            |c| {
                c.users.insert(key.clone());
            },
        );
        users.join_channel(key, name);

        let join = Message::new("JOIN")
            .with_prefix(user.ident())
            .with_middle(name.to_string());
        self.broadcast(users, name, join).await;
        Ok(updated)
    }

    /// §4.5 remove_user: broadcast `PART` *before* removal so the
    /// departing user also observes it, then drop both sides of the
    /// membership. Destroys the channel once it's empty.
    pub async fn remove_user(
        &self,
        users: &UserRegistry,
        name: &str,
        key: &UserKey,
        part_message: Option<String>,
    ) -> Result<(), ValidationError> {
        let channel = self
            .registry
            .get(&name.to_string())
            .ok_or(ValidationError::NoSuchChannel)?;
        if !channel.users.contains(key) {
            return Err(ValidationError::NotOnChannel);
        }
        let user = users.get(key).ok_or(ValidationError::NoSuchUser)?;

        let mut part = Message::new("PART")
            .with_prefix(user.ident())
            .with_middle(name.to_string());
        if let Some(reason) = part_message {
            part = part.with_trailing(reason);
        }
        self.broadcast(users, name, part).await;

        self.registry.alter(&name.to_string(), |c| {
            c.users.remove(key);
        });
        users.leave_channel(key, name);

        let now_empty = self
            .registry
            .get(&name.to_string())
            .map(|c| c.users.is_empty())
            .unwrap_or(true);
        if now_empty {
            self.registry.remove(&name.to_string());
        }
        Ok(())
    }

    /// Deliver to every member whose type is in `relay_to`. Each member's
    /// delivery is independent — one dead sink never prevents delivery to
    /// the others (§4.5/§7).
    pub async fn broadcast(&self, users: &UserRegistry, name: &str, msg: Message) {
        if let Some(channel) = self.registry.get(&name.to_string()) {
            for member in &channel.users {
                if users
                    .get(member)
                    .is_some_and(|u| channel.relay_to.contains(&u.kind))
                {
                    users.send(member, msg.clone()).await;
                }
            }
        }
    }

    /// Like `broadcast`, but skips `exclude` — used by channel PRIVMSG,
    /// which must not echo back to the sender (§8 scenario 8).
    pub async fn broadcast_excluding(
        &self,
        users: &UserRegistry,
        name: &str,
        exclude: &UserKey,
        msg: Message,
    ) {
        if let Some(channel) = self.registry.get(&name.to_string()) {
            for member in channel.users.iter().filter(|m| *m != exclude) {
                if users
                    .get(member)
                    .is_some_and(|u| channel.relay_to.contains(&u.kind))
                {
                    users.send(member, msg.clone()).await;
                }
            }
        }
    }

    pub fn set_topic(&self, name: &str, topic: String) -> Result<(), ValidationError> {
        if self.registry.alter(&name.to_string(), |c| c.topic = topic) {
            Ok(())
        } else {
            Err(ValidationError::NoSuchChannel)
        }
    }

    /// Host-facing restriction of which user types receive broadcasts in
    /// this channel (§3's `relay_to`); defaults to `{irc, virtual}`.
    pub fn set_relay_to(&self, name: &str, relay_to: HashSet<UserKind>) -> Result<(), ValidationError> {
        if self.registry.alter(&name.to_string(), |c| c.relay_to = relay_to) {
            Ok(())
        } else {
            Err(ValidationError::NoSuchChannel)
        }
    }

    /// Space-separated nick list for RPL_NAMREPLY (353).
    pub fn names_of(&self, users: &UserRegistry, name: &str) -> Option<String> {
        let channel = self.registry.get(&name.to_string())?;
        let names: Vec<String> = channel
            .users
            .iter()
            .filter_map(|key| users.get(key).and_then(|u| u.nick))
            .collect();
        Some(names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Sink;
    use tokio::sync::mpsc;

    async fn registered_user(users: &UserRegistry, key: &str, nick: &str) {
        let (tx, _rx) = mpsc::channel(8);
        users
            .register_virtual(
                key.to_string(),
                nick.to_string(),
                nick.to_string(),
                "Real Name".to_string(),
                "host".to_string(),
                Sink::Mailbox(tx),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn join_creates_channel_and_adds_member() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        registered_user(&users, "a", "alpha").await;

        let channel = channels.add_user(&users, "#hanabi", &"a".to_string()).await.unwrap();
        assert_eq!(channel.users.len(), 1);
        assert!(channel.users.contains(&"a".to_string()));
        assert!(users.get(&"a".to_string()).unwrap().channels.contains("#hanabi"));
    }

    #[tokio::test]
    async fn part_notifies_then_removes() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        registered_user(&users, "b", "beta").await;
        registered_user(&users, "g", "gamma").await;
        channels.add_user(&users, "#greek", &"b".to_string()).await.unwrap();
        channels.add_user(&users, "#greek", &"g".to_string()).await.unwrap();

        channels
            .remove_user(&users, "#greek", &"b".to_string(), Some("bye".to_string()))
            .await
            .unwrap();

        let channel = channels.get("#greek").unwrap();
        assert_eq!(channel.users, HashSet::from(["g".to_string()]));
        assert!(!users.get(&"b".to_string()).unwrap().channels.contains("#greek"));
    }

    #[tokio::test]
    async fn channel_membership_round_trips_through_join_and_part() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        registered_user(&users, "a", "alpha").await;
        registered_user(&users, "b", "beta").await;
        channels.add_user(&users, "#x", &"a".to_string()).await.unwrap();
        let before = channels.get("#x").unwrap().users;

        channels.add_user(&users, "#x", &"b".to_string()).await.unwrap();
        channels
            .remove_user(&users, "#x", &"b".to_string(), None)
            .await
            .unwrap();

        assert_eq!(channels.get("#x").unwrap().users, before);
    }

    #[tokio::test]
    async fn destroyed_when_last_member_parts() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        registered_user(&users, "a", "alpha").await;
        channels.add_user(&users, "#x", &"a".to_string()).await.unwrap();
        channels.remove_user(&users, "#x", &"a".to_string(), None).await.unwrap();
        assert!(channels.get("#x").is_none());
    }

    #[tokio::test]
    async fn broadcast_excluding_skips_only_the_sender() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        users
            .register_virtual("a".into(), "alpha".into(), "alpha".into(), "Alpha".into(), "host".into(), Sink::Mailbox(tx_a))
            .unwrap();
        users
            .register_virtual("b".into(), "beta".into(), "beta".into(), "Beta".into(), "host".into(), Sink::Mailbox(tx_b))
            .unwrap();
        channels.add_user(&users, "#x", &"a".to_string()).await.unwrap();
        channels.add_user(&users, "#x", &"b".to_string()).await.unwrap();

        // Drain the JOIN notifications before exercising the excluding broadcast.
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        let msg = Message::new("PRIVMSG").with_middle("#x".to_string()).with_trailing("hi");
        channels
            .broadcast_excluding(&users, "#x", &"a".to_string(), msg)
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn relay_to_restricts_broadcast_by_user_kind() {
        let users = UserRegistry::new();
        let channels = ChannelRegistry::new();
        registered_user(&users, "v", "virtue").await;
        let (tx_irc, mut rx_irc) = mpsc::channel(8);
        let irc_key = users.connect("host".to_string(), Sink::Tcp(tx_irc, Default::default()));

        channels.add_user(&users, "#x", &"v".to_string()).await.unwrap();
        channels.add_user(&users, "#x", &irc_key).await.unwrap();
        channels
            .set_relay_to(
                "#x",
                std::iter::once(crate::users::UserKind::Virtual).collect(),
            )
            .unwrap();

        while rx_irc.try_recv().is_ok() {}
        channels
            .broadcast(&users, "#x", Message::new("PRIVMSG").with_trailing("hi"))
            .await;

        assert!(rx_irc.try_recv().is_err());
    }
}

//! JOIN/PART/TOPIC/NAMES/LIST (§4.7).

use crate::errors::ValidationError;
use crate::grammar::is_valid_channel_name;
use crate::message::Message;
use crate::replies;
use crate::server::ServerState;
use crate::users::UserKey;

use super::{current_nick, first_param};

pub async fn handle_join(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(list) = first_param(msg) else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "JOIN"))
            .await;
        return;
    };

    for channel_name in list.split(',') {
        if !is_valid_channel_name(channel_name) {
            server
                .users()
                .send(key, replies::err_nosuchchannel(&server_name, &nick, channel_name))
                .await;
            continue;
        }
        match server
            .channels()
            .add_user(server.users(), channel_name, key)
            .await
        {
            Ok(channel) => {
                if channel.topic.is_empty() {
                    server
                        .users()
                        .send(key, replies::notopic(&server_name, &nick, channel_name))
                        .await;
                } else {
                    server
                        .users()
                        .send(
                            key,
                            replies::topic(&server_name, &nick, channel_name, &channel.topic),
                        )
                        .await;
                }
                if let Some(names) = server.channels().names_of(server.users(), channel_name) {
                    server
                        .users()
                        .send(
                            key,
                            replies::namreply(&server_name, &nick, channel_name, &names),
                        )
                        .await;
                }
                server
                    .users()
                    .send(key, replies::endofnames(&server_name, &nick, channel_name))
                    .await;
            }
            Err(_) => {
                server
                    .users()
                    .send(key, replies::err_nosuchchannel(&server_name, &nick, channel_name))
                    .await;
            }
        }
    }
}

pub async fn handle_part(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(list) = msg.middle_tokens().first().map(|s| s.to_string()) else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "PART"))
            .await;
        return;
    };
    let reason = msg.trailing.clone();

    for channel_name in list.split(',') {
        match server
            .channels()
            .remove_user(server.users(), channel_name, key, reason.clone())
            .await
        {
            Ok(()) => {}
            Err(ValidationError::NotOnChannel) => {
                server
                    .users()
                    .send(key, replies::err_notonchannel(&server_name, &nick, channel_name))
                    .await;
            }
            Err(_) => {
                server
                    .users()
                    .send(key, replies::err_nosuchchannel(&server_name, &nick, channel_name))
                    .await;
            }
        }
    }
}

pub async fn handle_topic(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(channel_name) = msg.middle_tokens().first().map(|s| s.to_string()) else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "TOPIC"))
            .await;
        return;
    };
    let Some(channel) = server.channels().get(&channel_name) else {
        server
            .users()
            .send(key, replies::err_nosuchchannel(&server_name, &nick, &channel_name))
            .await;
        return;
    };
    if !channel.users.contains(key) {
        server
            .users()
            .send(key, replies::err_notonchannel(&server_name, &nick, &channel_name))
            .await;
        return;
    }

    match &msg.trailing {
        Some(new_topic) => {
            let _ = server.channels().set_topic(&channel_name, new_topic.clone());
            let ident = server
                .users()
                .ident_for(key)
                .unwrap_or_else(|| nick.clone());
            let broadcast = Message::new("TOPIC")
                .with_prefix(ident)
                .with_middle(channel_name.clone())
                .with_trailing(new_topic.clone());
            server
                .channels()
                .broadcast(server.users(), &channel_name, broadcast)
                .await;
        }
        None => {
            if channel.topic.is_empty() {
                server
                    .users()
                    .send(key, replies::notopic(&server_name, &nick, &channel_name))
                    .await;
            } else {
                server
                    .users()
                    .send(
                        key,
                        replies::topic(&server_name, &nick, &channel_name, &channel.topic),
                    )
                    .await;
            }
        }
    }
}

pub async fn handle_names(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(channel_name) = msg.middle_tokens().first().map(|s| s.to_string()) else {
        return;
    };
    if let Some(names) = server.channels().names_of(server.users(), &channel_name) {
        server
            .users()
            .send(
                key,
                replies::namreply(&server_name, &nick, &channel_name, &names),
            )
            .await;
    }
    server
        .users()
        .send(key, replies::endofnames(&server_name, &nick, &channel_name))
        .await;
}

pub async fn handle_list(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    server
        .users()
        .send(key, replies::liststart(&server_name, &nick))
        .await;

    match msg.middle_tokens().first() {
        Some(filter) => {
            for name in filter.split(',') {
                // Invalid-form names are silently skipped; valid-form but
                // unknown names get 401 (§9 open-question resolution).
                if !is_valid_channel_name(name) {
                    continue;
                }
                match server.channels().get(name) {
                    Some(channel) => {
                        server
                            .users()
                            .send(
                                key,
                                replies::list(&server_name, &nick, name, channel.users.len(), &channel.topic),
                            )
                            .await;
                    }
                    None => {
                        server
                            .users()
                            .send(key, replies::err_nosuchnick(&server_name, &nick, name))
                            .await;
                    }
                }
            }
        }
        None => {
            for (name, channel) in server.channels().dump() {
                server
                    .users()
                    .send(
                        key,
                        replies::list(&server_name, &nick, &name, channel.users.len(), &channel.topic),
                    )
                    .await;
            }
        }
    }
    server
        .users()
        .send(key, replies::listend(&server_name, &nick))
        .await;
}

#[cfg(test)]
mod tests {
    use crate::handlers::dispatch;
    use crate::handlers::support::{connect, drain, register, test_server};
    use crate::numerics::{RPL_ENDOFNAMES, RPL_NAMREPLY, RPL_TOPIC};

    #[tokio::test]
    async fn join_sends_join_notopic_names_and_endofnames() {
        let server = test_server();
        let (key, mut rx) = connect(&server);
        register(&server, &key, "alpha").await;
        drain(&mut rx); // welcome burst + MOTD

        dispatch(&server, &key, "JOIN #chat").await;
        let replies = drain(&mut rx);
        let commands: Vec<&str> = replies.iter().map(|m| m.command.as_str()).collect();
        assert_eq!(commands, vec!["JOIN", RPL_TOPIC, RPL_NAMREPLY, RPL_ENDOFNAMES]);
        assert_eq!(replies[1].trailing.as_deref(), Some(""));
        assert_eq!(replies[2].trailing.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn part_broadcasts_to_remaining_member() {
        let server = test_server();
        let (key_a, mut rx_a) = connect(&server);
        register(&server, &key_a, "alpha").await;
        let (key_b, mut rx_b) = connect(&server);
        register(&server, &key_b, "beta").await;
        dispatch(&server, &key_a, "JOIN #chat").await;
        dispatch(&server, &key_b, "JOIN #chat").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(&server, &key_a, "PART #chat :bye").await;

        let to_b = drain(&mut rx_b);
        assert_eq!(to_b.len(), 1);
        assert_eq!(to_b[0].command, "PART");
        assert_eq!(to_b[0].trailing.as_deref(), Some("bye"));
    }
}

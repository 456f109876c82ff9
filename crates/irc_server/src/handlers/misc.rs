//! PING, WHOIS, MODE, MOTD, and the unknown-command fallback (§4.7).

use crate::errors::ProtocolError;
use crate::message::Message;
use crate::replies;
use crate::server::ServerState;
use crate::users::UserKey;

use super::{current_nick, first_param};

/// Only user-mode letter recognized; §9 explicitly rules out inventing
/// channel modes or the rest of RFC 2812's user-mode alphabet.
const RECOGNIZED_USER_MODES: [char; 1] = ['r'];

pub async fn handle_ping(server: &ServerState, key: &UserKey, msg: &Message) {
    let Some(token) = first_param(msg) else {
        return;
    };
    let server_name = server.hostname().to_string();
    let pong = Message::new("PONG")
        .with_prefix(server_name.clone())
        .with_middle(server_name)
        .with_trailing(token);
    server.users().send(key, pong).await;
}

pub async fn handle_whois(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(requested) = first_param(msg) else {
        server
            .users()
            .send(key, replies::err_nonicknamegiven(&server_name, &nick))
            .await;
        return;
    };
    // "Process only the first nick" (§4.7).
    let target = requested.split(',').next().unwrap_or(&requested);

    match server.users().find_by_nick(target) {
        Some(user) => {
            let ident = user.ident();
            let realname = user.realname.clone().unwrap_or_default();
            server
                .users()
                .send(key, replies::whoisuser(&server_name, &nick, target, &ident, &realname))
                .await;
            server
                .users()
                .send(key, replies::endofwhois(&server_name, &nick, target))
                .await;
        }
        None => {
            server
                .users()
                .send(key, replies::err_nosuchnick(&server_name, &nick, target))
                .await;
        }
    }
}

pub async fn handle_mode(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let tokens = msg.middle_tokens();

    let Some(target) = tokens.first() else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "MODE"))
            .await;
        return;
    };

    if target.starts_with('#') {
        // Channel MODE is not implemented (§9 open question).
        return;
    }
    if *target != nick {
        server
            .users()
            .send(key, replies::err_usersdontmatch(&server_name, &nick))
            .await;
        return;
    }

    match tokens.get(1) {
        None => {
            let modes: String = server
                .users()
                .get(key)
                .map(|u| u.modes.iter().collect())
                .unwrap_or_default();
            server
                .users()
                .send(key, replies::umodeis(&server_name, &nick, &modes))
                .await;
        }
        Some(change) => {
            let Some((sign, letters)) = change.split_at_checked(1) else {
                return;
            };
            let valid_sign = sign == "+" || sign == "-";
            let valid_letters = !letters.is_empty()
                && letters.chars().all(|c| RECOGNIZED_USER_MODES.contains(&c));
            if !valid_sign || !valid_letters {
                server
                    .users()
                    .send(key, replies::err_umodeunknownflag(&server_name, &nick))
                    .await;
                return;
            }
            server.users().apply_modes(key, sign == "+", letters);
        }
    }
}

pub async fn send_motd(server: &ServerState, key: &UserKey) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);

    let Some(path) = server.config().motd.clone() else {
        server
            .users()
            .send(key, replies::err_nomotd(&server_name, &nick))
            .await;
        return;
    };

    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => {
            server
                .users()
                .send(key, replies::motdstart(&server_name, &nick))
                .await;
            for line in contents.lines() {
                server
                    .users()
                    .send(key, replies::motd_line(&server_name, &nick, line))
                    .await;
            }
            server
                .users()
                .send(key, replies::endofmotd(&server_name, &nick))
                .await;
        }
        Err(err) => {
            log::warn!("failed to read MOTD file {}: {err}", path.display());
            server
                .users()
                .send(key, replies::err_nomotd(&server_name, &nick))
                .await;
        }
    }
}

pub async fn handle_unknown(server: &ServerState, key: &UserKey, command: &str) {
    let err = ProtocolError::UnknownCommand(command.to_string());
    log::warn!("{err}");
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    server
        .users()
        .send(key, replies::err_unknowncommand(&server_name, &nick, command))
        .await;
}

#[cfg(test)]
mod tests {
    use crate::handlers::dispatch;
    use crate::handlers::support::{connect, drain, register, test_server};
    use crate::numerics::{ERR_USERSDONTMATCH, RPL_UMODEIS};

    #[tokio::test]
    async fn unrecognized_command_gets_421() {
        let server = test_server();
        let (key, mut rx) = connect(&server);
        register(&server, &key, "alpha").await;
        drain(&mut rx);

        dispatch(&server, &key, "FROB foo").await;
        let replies = drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command, crate::numerics::ERR_UNKNOWNCOMMAND);
    }

    #[tokio::test]
    async fn mode_query_with_no_changes_reports_current_modes() {
        let server = test_server();
        let (key, mut rx) = connect(&server);
        register(&server, &key, "alpha").await;
        drain(&mut rx);

        dispatch(&server, &key, "MODE alpha").await;
        let replies = drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command, RPL_UMODEIS);
        assert_eq!(replies[0].trailing.as_deref(), Some("+"));
    }

    #[tokio::test]
    async fn mode_set_then_query_reflects_the_change() {
        let server = test_server();
        let (key, mut rx) = connect(&server);
        register(&server, &key, "alpha").await;
        drain(&mut rx);

        dispatch(&server, &key, "MODE alpha +r").await;
        dispatch(&server, &key, "MODE alpha").await;
        let replies = drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].trailing.as_deref(), Some("+r"));
    }

    #[tokio::test]
    async fn mode_for_another_user_is_rejected() {
        let server = test_server();
        let (key_a, mut rx_a) = connect(&server);
        register(&server, &key_a, "alpha").await;
        let (key_b, _rx_b) = connect(&server);
        register(&server, &key_b, "beta").await;
        drain(&mut rx_a);

        dispatch(&server, &key_a, "MODE beta +r").await;
        let replies = drain(&mut rx_a);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command, ERR_USERSDONTMATCH);
    }
}

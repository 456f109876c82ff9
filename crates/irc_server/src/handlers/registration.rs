//! PASS/NICK/USER/QUIT and a minimal ack-and-ignore CAP (§4.4, §4.7).

use crate::errors::{ProtocolError, ValidationError};
use crate::message::Message;
use crate::replies;
use crate::server::ServerState;
use crate::users::UserKey;

use super::{current_nick, first_param};

pub async fn handle_pass(server: &ServerState, key: &UserKey, msg: &Message) {
    if server
        .users()
        .is_registered(key, server.password_required())
    {
        return; // pre-handshake only; silently ignored after
    }
    let Some(password) = first_param(msg) else {
        return;
    };
    if server.config().password.as_deref() == Some(password.as_str()) {
        server.users().set_pass_ok(key);
    }
}

pub async fn handle_nick(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);
    let Some(new_nick) = first_param(msg) else {
        server
            .users()
            .send(key, replies::err_nonicknamegiven(&server_name, &nick))
            .await;
        return;
    };

    let was_registered = server
        .users()
        .is_registered(key, server.password_required());

    match server
        .users()
        .change_nick(key, &new_nick, server.channels())
        .await
    {
        Ok(()) => {
            if !was_registered {
                try_complete_registration(server, key).await;
            }
        }
        Err(err @ ValidationError::ErroneousNick) => {
            log::warn!("{}", ProtocolError::from(err));
            server
                .users()
                .send(key, replies::err_erroneusnickname(&server_name, &nick, &new_nick))
                .await;
        }
        Err(err @ ValidationError::NickInUse) => {
            log::warn!("{}", ProtocolError::from(err));
            server
                .users()
                .send(key, replies::err_nicknameinuse(&server_name, &nick, &new_nick))
                .await;
        }
        Err(_) => {}
    }
}

pub async fn handle_user(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);

    if server
        .users()
        .is_registered(key, server.password_required())
    {
        server
            .users()
            .send(key, replies::err_alreadyregistered(&server_name, &nick))
            .await;
        return;
    }

    let tokens = msg.middle_tokens();
    let (Some(username), Some(realname)) = (tokens.first(), msg.trailing.as_ref()) else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "USER"))
            .await;
        return;
    };
    let hostname = server
        .users()
        .get(key)
        .and_then(|u| u.hostname)
        .unwrap_or_else(|| server_name.clone());

    match server
        .users()
        .set_user_details(key, username.to_string(), realname.clone(), hostname)
    {
        Ok(()) => try_complete_registration(server, key).await,
        Err(err @ ValidationError::AlreadyRegistered) => {
            log::warn!("{}", ProtocolError::from(err));
            server
                .users()
                .send(key, replies::err_alreadyregistered(&server_name, &nick))
                .await;
        }
        Err(_) => {}
    }
}

pub async fn handle_quit(server: &ServerState, key: &UserKey, msg: &Message) {
    server
        .users()
        .remove(key, msg.trailing.clone(), server.channels())
        .await;
}

/// IRCv3 CAP negotiation, acknowledged and otherwise ignored (explicitly
/// out of scope beyond that).
pub async fn handle_cap(server: &ServerState, key: &UserKey, msg: &Message) {
    let nick = current_nick(server, key);
    let Some(sub) = msg.middle_tokens().first().map(|s| s.to_ascii_uppercase()) else {
        return;
    };
    match sub.as_str() {
        "LS" | "LIST" => {
            let reply = Message::new("CAP")
                .with_prefix(server.hostname().to_string())
                .with_middle(format!("{nick} {sub}"))
                .with_trailing("");
            server.users().send(key, reply).await;
        }
        _ => {}
    }
}

/// Send the welcome burst (001-004 + MOTD) the first time registration
/// completes.
async fn try_complete_registration(server: &ServerState, key: &UserKey) {
    if !server
        .users()
        .is_registered(key, server.password_required())
    {
        return;
    }
    let Some(user) = server.users().get(key) else {
        return;
    };
    let server_name = server.hostname().to_string();
    let nick = user.nick.clone().unwrap_or_default();
    let ident = user.ident();
    let version = server.config().version.clone();
    let network_name = server.config().network_name.clone();
    let created_on = server.config().network_created_on.clone();

    let greeting = [
        replies::welcome(&server_name, &nick, &ident, network_name.as_deref()),
        replies::yourhost(&server_name, &nick, &version),
        replies::created(&server_name, &nick, created_on.as_deref()),
        replies::myinfo(&server_name, &nick, &version),
    ];
    for reply in greeting {
        server.users().send(key, reply).await;
    }
    super::misc::send_motd(server, key).await;
}

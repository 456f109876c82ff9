//! PRIVMSG (§4.7): direct delivery to a nick, or channel broadcast that
//! excludes the sender (§8 scenario 8).

use crate::message::Message;
use crate::replies;
use crate::server::ServerState;
use crate::users::UserKey;

use super::current_nick;

pub async fn handle_privmsg(server: &ServerState, key: &UserKey, msg: &Message) {
    let server_name = server.hostname().to_string();
    let nick = current_nick(server, key);

    let Some(target) = msg.middle_tokens().first().map(|s| s.to_string()) else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "PRIVMSG"))
            .await;
        return;
    };
    let Some(text) = msg.trailing.clone() else {
        server
            .users()
            .send(key, replies::err_needmoreparams(&server_name, &nick, "PRIVMSG"))
            .await;
        return;
    };

    let ident = server
        .users()
        .ident_for(key)
        .unwrap_or_else(|| nick.clone());
    let out = Message::new("PRIVMSG")
        .with_prefix(ident)
        .with_middle(target.clone())
        .with_trailing(text);

    if target.starts_with('#') {
        if server.channels().get(&target).is_none() {
            server
                .users()
                .send(key, replies::err_nosuchchannel(&server_name, &nick, &target))
                .await;
            return;
        }
        server
            .channels()
            .broadcast_excluding(server.users(), &target, key, out)
            .await;
    } else {
        match server.users().find_by_nick(&target) {
            Some(recipient) => server.users().send(&recipient.key, out).await,
            None => {
                server
                    .users()
                    .send(key, replies::err_nosuchnick(&server_name, &nick, &target))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::dispatch;
    use crate::handlers::support::{connect, drain, register, test_server};

    #[tokio::test]
    async fn channel_privmsg_excludes_sender_and_reaches_others() {
        let server = test_server();
        let (key_a, mut rx_a) = connect(&server);
        register(&server, &key_a, "alpha").await;
        let (key_b, mut rx_b) = connect(&server);
        register(&server, &key_b, "beta").await;
        dispatch(&server, &key_a, "JOIN #chat").await;
        dispatch(&server, &key_b, "JOIN #chat").await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        dispatch(&server, &key_a, "PRIVMSG #chat :hello").await;

        assert!(drain(&mut rx_a).is_empty());
        let to_b = drain(&mut rx_b);
        assert_eq!(to_b.len(), 1);
        assert_eq!(to_b[0].command, "PRIVMSG");
        assert_eq!(to_b[0].trailing.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn direct_privmsg_to_unknown_nick_gets_401() {
        let server = test_server();
        let (key, mut rx) = connect(&server);
        register(&server, &key, "alpha").await;
        drain(&mut rx);

        dispatch(&server, &key, "PRIVMSG ghost :hi").await;

        let replies = drain(&mut rx);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].command, crate::numerics::ERR_NOSUCHNICK);
    }
}

//! Numeric reply builders (§4.2/§4.7). Each function returns a fully-formed
//! `Message` with the server hostname as prefix and the numeric as command,
//! matching RFC 1459 §6's reply format.

use crate::message::Message;
use crate::numerics::*;

fn numeric(server: &str, code: &str, target: &str, middle_extra: &str) -> Message {
    let middle = if middle_extra.is_empty() {
        target.to_string()
    } else {
        format!("{target} {middle_extra}")
    };
    Message::new(code).with_prefix(server).with_middle(middle)
}

pub fn welcome(server: &str, nick: &str, ident: &str, network_name: Option<&str>) -> Message {
    let network = network_name.unwrap_or("this network");
    numeric(server, RPL_WELCOME, nick, "").with_trailing(format!(
        "Welcome to {network} {ident}"
    ))
}

pub fn yourhost(server: &str, nick: &str, version: &str) -> Message {
    numeric(server, RPL_YOURHOST, nick, "")
        .with_trailing(format!("Your host is {server}, running version {version}"))
}

pub fn created(server: &str, nick: &str, created_on: Option<&str>) -> Message {
    let when = created_on.unwrap_or("at an unknown time");
    numeric(server, RPL_CREATED, nick, "")
        .with_trailing(format!("This server was created {when}"))
}

pub fn myinfo(server: &str, nick: &str, version: &str) -> Message {
    numeric(server, RPL_MYINFO, nick, &format!("{server} {version} r r"))
}

pub fn umodeis(server: &str, nick: &str, modes: &str) -> Message {
    numeric(server, RPL_UMODEIS, nick, "").with_trailing(format!("+{modes}"))
}

pub fn err_umodeunknownflag(server: &str, nick: &str) -> Message {
    numeric(server, ERR_UMODEUNKNOWNFLAG, nick, "").with_trailing("Unknown MODE flag")
}

pub fn err_usersdontmatch(server: &str, nick: &str) -> Message {
    numeric(server, ERR_USERSDONTMATCH, nick, "")
        .with_trailing("Cannot change mode for other users")
}

pub fn whoisuser(server: &str, nick: &str, target: &str, ident: &str, realname: &str) -> Message {
    // ident is "nick!user@host"; split for the 311 layout (nick user host * :realname).
    let (user, host) = ident
        .split_once('@')
        .map(|(nu, host)| (nu.rsplit_once('!').map(|(_, u)| u).unwrap_or(nu), host))
        .unwrap_or(("", ""));
    numeric(server, RPL_WHOISUSER, nick, &format!("{target} {user} {host} *"))
        .with_trailing(realname)
}

pub fn endofwhois(server: &str, nick: &str, target: &str) -> Message {
    numeric(server, RPL_ENDOFWHOIS, nick, target).with_trailing("End of WHOIS list")
}

pub fn err_nosuchnick(server: &str, nick: &str, target: &str) -> Message {
    numeric(server, ERR_NOSUCHNICK, nick, target).with_trailing("No such nick/channel")
}

pub fn err_nosuchchannel(server: &str, nick: &str, channel: &str) -> Message {
    numeric(server, ERR_NOSUCHCHANNEL, nick, channel).with_trailing("No such channel")
}

pub fn err_notonchannel(server: &str, nick: &str, channel: &str) -> Message {
    numeric(server, ERR_NOTONCHANNEL, nick, channel).with_trailing("You're not on that channel")
}

pub fn topic(server: &str, nick: &str, channel: &str, topic: &str) -> Message {
    numeric(server, RPL_TOPIC, nick, channel).with_trailing(topic)
}

/// §4.2 has no distinct "no topic set" numeric; §4.7's TOPIC row replies
/// with 332 and an empty trailing when there is no topic.
pub fn notopic(server: &str, nick: &str, channel: &str) -> Message {
    topic(server, nick, channel, "")
}

pub fn namreply(server: &str, nick: &str, channel: &str, names: &str) -> Message {
    numeric(server, RPL_NAMREPLY, nick, &format!("= {channel}")).with_trailing(names)
}

pub fn endofnames(server: &str, nick: &str, channel: &str) -> Message {
    numeric(server, RPL_ENDOFNAMES, nick, channel).with_trailing("End of NAMES list")
}

pub fn liststart(server: &str, nick: &str) -> Message {
    numeric(server, RPL_LISTSTART, nick, "Channel").with_trailing("Users Name")
}

pub fn list(server: &str, nick: &str, channel: &str, visible: usize, topic: &str) -> Message {
    numeric(server, RPL_LIST, nick, &format!("{channel} {visible}")).with_trailing(topic)
}

pub fn listend(server: &str, nick: &str) -> Message {
    numeric(server, RPL_LISTEND, nick, "").with_trailing("End of LIST")
}

pub fn motdstart(server: &str, nick: &str) -> Message {
    numeric(server, RPL_MOTDSTART, nick, "")
        .with_trailing(format!("- {server} Message of the day - "))
}

pub fn motd_line(server: &str, nick: &str, line: &str) -> Message {
    numeric(server, RPL_MOTD, nick, "").with_trailing(format!("- {line}"))
}

pub fn endofmotd(server: &str, nick: &str) -> Message {
    numeric(server, RPL_ENDOFMOTD, nick, "").with_trailing("End of MOTD command")
}

pub fn err_nomotd(server: &str, nick: &str) -> Message {
    numeric(server, ERR_NOMOTD, nick, "").with_trailing("MOTD File is missing")
}

pub fn err_nonicknamegiven(server: &str, nick: &str) -> Message {
    numeric(server, ERR_NONICKNAMEGIVEN, nick, "").with_trailing("No nickname given")
}

pub fn err_erroneusnickname(server: &str, nick: &str, attempted: &str) -> Message {
    numeric(server, ERR_ERRONEUSNICKNAME, nick, attempted).with_trailing("Erroneous nickname")
}

pub fn err_nicknameinuse(server: &str, nick: &str, attempted: &str) -> Message {
    numeric(server, ERR_NICKNAMEINUSE, nick, attempted).with_trailing("Nickname is already in use")
}

pub fn err_needmoreparams(server: &str, nick: &str, command: &str) -> Message {
    numeric(server, ERR_NEEDMOREPARAMS, nick, command).with_trailing("Not enough parameters")
}

pub fn err_alreadyregistered(server: &str, nick: &str) -> Message {
    numeric(server, ERR_ALREADYREGISTRED, nick, "").with_trailing("Unauthorized command (already registered)")
}

pub fn err_unknowncommand(server: &str, nick: &str, command: &str) -> Message {
    numeric(server, ERR_UNKNOWNCOMMAND, nick, command).with_trailing("Unknown command")
}

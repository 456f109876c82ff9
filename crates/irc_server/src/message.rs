//! The C1 message codec: parsing a raw line into `{prefix, command, middle,
//! trailing}` and serializing it back, per RFC 1459 §2.3.1.
//!
//!     message    =  [ ":" prefix SPACE ] command [ params ] crlf
//!     params     =  *14( SPACE middle ) [ SPACE ":" trailing ]
//!
//! Framing (CRLF splitting) is the listener's job; this module only ever
//! sees one already-split line at a time.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub middle: String,
    pub trailing: Option<String>,
}

impl Message {
    pub fn new(command: impl Into<String>) -> Self {
        Message {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_middle(mut self, middle: impl Into<String>) -> Self {
        self.middle = middle.into();
        self
    }

    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Parse a single line, CR/LF already stripped by the caller. An empty
    /// or otherwise unparseable line yields a message with an empty
    /// `command`, which the dispatcher treats as a no-op.
    pub fn parse(line: &str) -> Message {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Message::default();
        }

        let mut rest = line;
        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            match stripped.split_once(' ') {
                Some((p, remainder)) => {
                    prefix = Some(p.to_string());
                    rest = remainder.trim_start_matches(' ');
                }
                None => {
                    // A prefix with nothing after it: no command to dispatch on.
                    return Message {
                        prefix: Some(stripped.to_string()),
                        ..Default::default()
                    };
                }
            }
        }

        let (command, params_str) = match rest.split_once(' ') {
            Some((cmd, params)) => (cmd.to_string(), params.trim_start_matches(' ')),
            None => (rest.to_string(), ""),
        };

        let (middle, trailing) = split_params(params_str);

        Message {
            prefix,
            command,
            middle,
            trailing,
        }
    }

    /// Serialize back to wire form, without the trailing CRLF.
    pub fn build(&self) -> String {
        let mut out = String::new();
        if let Some(prefix) = &self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(&self.command);
        if !self.middle.is_empty() {
            out.push(' ');
            out.push_str(&self.middle);
        }
        if let Some(trailing) = &self.trailing {
            out.push_str(" :");
            out.push_str(trailing);
        }
        out
    }

    /// `build()` plus the transport-level CRLF terminator.
    pub fn into_wire(&self) -> String {
        format!("{}\r\n", self.build())
    }

    /// Space-separated middle tokens, for commands that take a list.
    pub fn middle_tokens(&self) -> Vec<&str> {
        self.middle.split(' ').filter(|s| !s.is_empty()).collect()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}

fn split_params(params_str: &str) -> (String, Option<String>) {
    if params_str.is_empty() {
        return (String::new(), None);
    }
    if let Some(rest) = params_str.strip_prefix(':') {
        return (String::new(), Some(rest.to_string()));
    }
    match params_str.split_once(" :") {
        Some((middle, trailing)) => (middle.to_string(), Some(trailing.to_string())),
        None => (params_str.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_prefix_and_trailing() {
        let m = Message::parse(":Angel PRIVMSG Wiz :Hello are you receiving this message ?");
        assert_eq!(m.prefix.as_deref(), Some("Angel"));
        assert_eq!(m.command, "PRIVMSG");
        assert_eq!(m.middle, "Wiz");
        assert_eq!(
            m.trailing.as_deref(),
            Some("Hello are you receiving this message ?")
        );
    }

    #[test]
    fn builds_user_command() {
        let m = Message::new("USER")
            .with_middle("guest tolmoon tolsun")
            .with_trailing("Ronnie Reagan");
        assert_eq!(m.build(), "USER guest tolmoon tolsun :Ronnie Reagan");
    }

    #[test]
    fn parses_command_with_no_params() {
        let m = Message::parse("MOTD");
        assert_eq!(m.command, "MOTD");
        assert_eq!(m.middle, "");
        assert!(m.trailing.is_none());
    }

    #[test]
    fn empty_line_yields_empty_command() {
        let m = Message::parse("");
        assert_eq!(m.command, "");
    }

    #[test]
    fn round_trips_well_formed_messages() {
        let cases = [
            ":Angel PRIVMSG Wiz :Hello are you receiving this message ?",
            "USER guest tolmoon tolsun :Ronnie Reagan",
            "NICK alpha",
            ":irc.example.org 001 alpha :Welcome",
            "JOIN #hanabi",
        ];
        for raw in cases {
            let parsed = Message::parse(raw);
            assert_eq!(parsed.build(), raw, "round trip failed for {raw:?}");
            assert_eq!(Message::parse(&parsed.build()), parsed);
        }
    }

    #[test]
    fn parse_is_a_pure_function() {
        let raw = ":a!b@c PRIVMSG #chan :hi there";
        assert_eq!(Message::parse(raw), Message::parse(raw));
    }
}

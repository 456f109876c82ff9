//! Nick and channel-name grammar (§4.1), built with `nom` combinators in
//! the style of the parsers elsewhere in this crate.

use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    sequence::pair,
};

fn is_nick_first_char(c: char) -> bool {
    c.is_ascii_alphabetic() || "_-[]\\^{}|`".contains(c)
}

fn is_nick_tail_char(c: char) -> bool {
    is_nick_first_char(c) || c.is_ascii_digit()
}

fn is_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn nickname(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_nick_first_char), take_while1(is_nick_tail_char))).parse(input)
}

fn channel_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(|c| c == '#'), take_while1(is_channel_char))).parse(input)
}

/// `^[A-Za-z_\-\[\]\\^{}|`][A-Za-z0-9_\-\[\]\\^{}|`]{2,15}$` — length 3–16.
pub fn is_valid_nick_syntax(s: &str) -> bool {
    if !(3..=16).contains(&s.len()) {
        return false;
    }
    all_consuming(nickname).parse(s).is_ok()
}

/// `^#\w+$`
pub fn is_valid_channel_name(s: &str) -> bool {
    all_consuming(channel_name).parse(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_nicknames() {
        assert!(is_valid_nick_syntax("lambda"));
        assert!(!is_valid_nick_syntax("#lambda"));
        assert!(!is_valid_nick_syntax("la!+mbda"));
    }

    #[test]
    fn rejects_too_short_or_too_long_nicks() {
        assert!(!is_valid_nick_syntax("ab"));
        assert!(!is_valid_nick_syntax(&"a".repeat(17)));
        assert!(is_valid_nick_syntax(&"a".repeat(16)));
    }

    #[test]
    fn validates_channel_names() {
        assert!(is_valid_channel_name("#hanabi"));
        assert!(!is_valid_channel_name("hanabi"));
        assert!(!is_valid_channel_name("# ewer"));
    }
}

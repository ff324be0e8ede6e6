//! Minimal IRC line parsing with IRCv3 tags
//!
//! Covers exactly what Twitch chat sends: optional `@tags`, optional
//! `:prefix`, a command, middle parameters and a trailing parameter.

use std::collections::HashMap;

/// One parsed IRC line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IrcLine {
    /// IRCv3 message tags, unescaped
    pub tags: HashMap<String, String>,
    /// Source prefix without the leading `:`
    pub prefix: Option<String>,
    /// Command or numeric, upper-case as sent
    pub command: String,
    /// Parameters; the trailing parameter, if any, is last
    pub params: Vec<String>,
}

impl IrcLine {
    /// Nickname part of the prefix (`nick!user@host` → `nick`)
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split('!').next().unwrap_or(p))
    }

    /// Tag value by name, if present and non-empty
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Parse the `badges` tag into name → version
    pub fn badges(&self) -> HashMap<String, String> {
        parse_badges(self.tag("badges").unwrap_or_default())
    }
}

/// Parse a single IRC line (without the trailing CRLF)
///
/// Returns `None` for empty lines or lines without a command.
///
/// # Examples
///
/// ```
/// use raynna_bot::chat::irc::parse_line;
///
/// let line = parse_line(":viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :!ask hi").unwrap();
/// assert_eq!(line.command, "PRIVMSG");
/// assert_eq!(line.nick(), Some("viewer"));
/// assert_eq!(line.params, vec!["#chan", "!ask hi"]);
/// ```
pub fn parse_line(raw: &str) -> Option<IrcLine> {
    let mut rest = raw.trim_end_matches(['\r', '\n']);
    let mut line = IrcLine::default();

    if let Some(stripped) = rest.strip_prefix('@') {
        let (tags, remainder) = stripped.split_once(' ')?;
        line.tags = parse_tags(tags);
        rest = remainder.trim_start();
    }

    if let Some(stripped) = rest.strip_prefix(':') {
        let (prefix, remainder) = stripped.split_once(' ')?;
        line.prefix = Some(prefix.to_string());
        rest = remainder.trim_start();
    }

    let (head, trailing) = match rest.split_once(" :") {
        Some((head, trailing)) => (head, Some(trailing)),
        None => (rest, None),
    };

    let mut parts = head.split_whitespace();
    line.command = parts.next()?.to_string();
    line.params = parts.map(str::to_string).collect();
    if let Some(trailing) = trailing {
        line.params.push(trailing.to_string());
    }

    Some(line)
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Parse a Twitch badge list such as `moderator/1,subscriber/12`
pub fn parse_badges(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter(|badge| !badge.is_empty())
        .map(|badge| match badge.split_once('/') {
            Some((name, version)) => (name.to_string(), version.to_string()),
            None => (badge.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ping() {
        let line = parse_line("PING :tmi.twitch.tv").unwrap();
        assert_eq!(line.command, "PING");
        assert_eq!(line.params, vec!["tmi.twitch.tv"]);
        assert!(line.prefix.is_none());
    }

    #[test]
    fn test_parse_tagged_privmsg() {
        let raw = "@badge-info=;badges=moderator/1,subscriber/12;display-name=Viewer;user-id=42 \
                   :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #raynnacs :!ask what is 2+2?\r\n";
        let line = parse_line(raw).unwrap();
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.nick(), Some("viewer"));
        assert_eq!(line.tag("display-name"), Some("Viewer"));
        assert_eq!(line.tag("badge-info"), None);
        assert_eq!(line.params, vec!["#raynnacs", "!ask what is 2+2?"]);

        let badges = line.badges();
        assert_eq!(badges.get("moderator").map(String::as_str), Some("1"));
        assert_eq!(badges.get("subscriber").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_trailing_keeps_inner_colons() {
        let line = parse_line(":a!a@a PRIVMSG #c :see https://example.com :)").unwrap();
        assert_eq!(line.params[1], "see https://example.com :)");
    }

    #[test]
    fn test_parse_userstate_without_trailing() {
        let line = parse_line("@badges=vip/1;mod=0 :tmi.twitch.tv USERSTATE #chan").unwrap();
        assert_eq!(line.command, "USERSTATE");
        assert_eq!(line.params, vec!["#chan"]);
        assert!(line.badges().contains_key("vip"));
    }

    #[test]
    fn test_tag_unescaping() {
        let line = parse_line(r"@system-msg=hello\sworld\:\\ok :tmi.twitch.tv NOTICE #c :x").unwrap();
        assert_eq!(line.tag("system-msg"), Some(r"hello world;\ok"));
    }

    #[test]
    fn test_empty_line_is_none() {
        assert!(parse_line("").is_none());
        assert!(parse_line("@only-tags").is_none());
    }
}

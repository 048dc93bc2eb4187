//! `%`-prefixed session directives.

use super::query::MatchMode;
use crate::types::Language;

/// A recognized directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Lang(Language),
    Mode(MatchMode),
    /// `None` lifts the limit (`%limit 0`).
    Limit(Option<usize>),
    Color(bool),
    Details(bool),
}

impl Directive {
    /// Whether `line` is a directive line at all, recognized or not.
    pub fn is_directive(line: &str) -> bool {
        line.starts_with('%')
    }

    /// Parse a trimmed directive line. Unknown or malformed directives
    /// yield `None`.
    pub fn parse(line: &str) -> Option<Directive> {
        let body = line.strip_prefix('%')?;
        let words: Vec<&str> = body.split_whitespace().collect();

        match words.as_slice() {
            ["lang", tag] => Language::from_tag(tag).map(Directive::Lang),
            ["term"] => Some(Directive::Mode(MatchMode::Term)),
            ["phrase"] => Some(Directive::Mode(MatchMode::Phrase)),
            ["fuzzy"] => Some(Directive::Mode(MatchMode::Fuzzy)),
            ["limit", n] => match n.parse::<usize>() {
                Ok(0) => Some(Directive::Limit(None)),
                Ok(n) => Some(Directive::Limit(Some(n))),
                Err(_) => None,
            },
            ["color", state] => on_off(state).map(Directive::Color),
            ["details", state] => on_off(state).map(Directive::Details),
            _ => None,
        }
    }
}

fn on_off(word: &str) -> Option<bool> {
    match word {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

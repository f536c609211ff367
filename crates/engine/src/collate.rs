//! Natural, case-aware text ordering: "item 9" sorts before "item 10".
//!
//! Strings are compared on three levels. First as a sequence of tokens:
//! whitespace and punctuation sort lowest, then runs of ASCII digits compared
//! by numeric value, then every other character compared case-insensitively. Ties are
//! broken by letter case, lowercase first, and finally by the raw text, so
//! the order is total.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Token<'a> {
    Separator(char),
    /// Digit run with leading zeros stripped; compared by length then digits.
    Number(usize, &'a str),
    Char(char),
}

fn tokens(s: &str) -> impl Iterator<Item = Token<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let c = rest.chars().next()?;
        if c.is_ascii_digit() {
            let end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(rest.len());
            let digits = rest[..end].trim_start_matches('0');
            rest = &rest[end..];
            Some(Token::Number(digits.len(), digits))
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            rest = &rest[c.len_utf8()..];
            Some(Token::Separator(c))
        } else {
            rest = &rest[c.len_utf8()..];
            Some(Token::Char(c.to_lowercase().next().unwrap_or(c)))
        }
    })
}

/// Lowercase-before-uppercase tie-break key.
fn case_key(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    tokens(a)
        .cmp(tokens(b))
        .then_with(|| case_key(a).cmp(case_key(b)))
        .then_with(|| a.cmp(b))
}

//! Identifier scanning shared by search and symbol lookup

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Shortest identifier that counts toward similarity scoring.
const MIN_TOKEN_LEN: usize = 3;

fn identifier_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").ok())
        .as_ref()
}

/// Every identifier in `text`, case preserved, in order of appearance.
pub fn identifiers(text: &str) -> impl Iterator<Item = &str> {
    identifier_regex()
        .into_iter()
        .flat_map(move |re| re.find_iter(text).map(|m| m.as_str()))
}

/// Lower-cased identifiers of length three or more.
pub fn identifier_tokens(text: &str) -> HashSet<String> {
    identifiers(text)
        .filter(|ident| ident.len() >= MIN_TOKEN_LEN)
        .map(str::to_ascii_lowercase)
        .collect()
}

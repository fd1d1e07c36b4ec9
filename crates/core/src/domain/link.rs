// Link Domain Model + Extractor

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosts accepted when no explicit list is configured
pub const DEFAULT_ACCEPTED_HOSTS: &[&str] = &[
    "terabox.com",
    "1024terabox.com",
    "teraboxapp.com",
    "terabox.app",
];

/// A link matched by the extractor. Opaque once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(String);

impl Link {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pulls links for a configured set of hosts out of free text.
///
/// A match is `http(s)://`, any run of non-whitespace containing one of the
/// accepted hosts, then `/` and at least one more non-whitespace character.
/// Matches are returned left to right and never overlap.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    hosts: Vec<String>,
    pattern: Option<Regex>,
}

impl LinkExtractor {
    /// Build an extractor for the given hosts.
    ///
    /// Host entries are matched literally; blank entries are ignored. An empty
    /// host list produces an extractor that never matches.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts: Vec<String> = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let pattern = if hosts.is_empty() {
            None
        } else {
            let alternation = hosts
                .iter()
                .map(|h| regex::escape(h))
                .collect::<Vec<_>>()
                .join("|");
            // Only escaped literals are interpolated, so the pattern always compiles
            Regex::new(&format!(r"https?://\S*(?:{alternation})/\S+")).ok()
        };

        Self { hosts, pattern }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Extract all links from `text`, in order of appearance.
    pub fn extract(&self, text: &str) -> Vec<Link> {
        match &self.pattern {
            Some(re) if !text.is_empty() => re
                .find_iter(text)
                .map(|m| Link::new(m.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Same as [`extract`](Self::extract) for an optional text body.
    pub fn extract_opt(&self, text: Option<&str>) -> Vec<Link> {
        text.map(|t| self.extract(t)).unwrap_or_default()
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_HOSTS)
    }
}

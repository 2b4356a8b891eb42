//! Search field selector.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Which message field a search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Any SMTP recipient (`raw.to`).
    To,
    /// The SMTP sender (`raw.from`).
    From,
    /// The raw message data (`raw.data`).
    Containing,
}

impl SearchKind {
    /// Document path the kind filters on.
    pub fn field(&self) -> &'static str {
        match self {
            SearchKind::To => "raw.to",
            SearchKind::From => "raw.from",
            SearchKind::Containing => "raw.data",
        }
    }
}

/// Regex source for an unanchored, Unicode case-insensitive match on `query`.
pub fn search_pattern(query: &str) -> String {
    format!("(?i){}", query)
}

/// Compiles a search query; a malformed pattern is a [`StorageError::Query`].
pub fn search_regex(query: &str) -> Result<Regex, StorageError> {
    Regex::new(&search_pattern(query))
        .map_err(|e| StorageError::Query(format!("invalid search pattern '{}': {}", query, e)))
}

/// `"to"` and `"from"` select those fields; anything else searches the message data.
impl FromStr for SearchKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "to" => SearchKind::To,
            "from" => SearchKind::From,
            _ => SearchKind::Containing,
        })
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchKind::To => "to",
            SearchKind::From => "from",
            SearchKind::Containing => "containing",
        };
        f.write_str(s)
    }
}

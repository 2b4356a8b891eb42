//! Captured email message document.
//!
//! Field names follow the stored document layout (`id`, `from`, `to`, `content`,
//! `created`, `mime`, `raw`). List and search results are projected, so `content.body`,
//! `content.mime` and `mime` come back empty there; every field therefore has a default.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered result container for list and search.
pub type Messages = Vec<Message>;

/// One captured email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub from: Option<Path>,
    #[serde(default)]
    pub to: Vec<Path>,
    #[serde(default)]
    pub content: Content,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<MimeBody>,
    #[serde(default)]
    pub raw: Option<SmtpMessage>,
}

impl Message {
    /// Creates a message with a generated UUID and current timestamp.
    pub fn new(from: Path, to: Vec<Path>, content: Content, raw: SmtpMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: Some(from),
            to,
            content,
            created: Utc::now(),
            mime: None,
            raw: Some(raw),
        }
    }

    /// Drops the fields that list and search do not return.
    pub fn projected(mut self) -> Self {
        self.content.body = String::new();
        self.content.mime = None;
        self.mime = None;
        self
    }
}

/// SMTP reverse/forward path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub relays: Vec<String>,
    pub mailbox: String,
    pub domain: String,
    #[serde(default)]
    pub params: String,
}

impl Path {
    /// Parses `[@relay,@relay:]mailbox@domain`, tolerating surrounding angle brackets.
    pub fn parse(address: &str) -> Self {
        let address = address.trim().trim_start_matches('<').trim_end_matches('>');
        let (relays, mailbox_domain) = match address.rsplit_once(':') {
            Some((relays, rest)) if relays.starts_with('@') => (
                relays
                    .split(',')
                    .map(|r| r.trim_start_matches('@').to_string())
                    .collect(),
                rest,
            ),
            _ => (Vec::new(), address),
        };
        let (mailbox, domain) = match mailbox_domain.rsplit_once('@') {
            Some((mailbox, domain)) => (mailbox.to_string(), domain.to_string()),
            None => (mailbox_domain.to_string(), String::new()),
        };
        Self {
            relays,
            mailbox,
            domain,
            params: String::new(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}", self.mailbox)
        } else {
            write!(f, "{}@{}", self.mailbox, self.domain)
        }
    }
}

/// Parsed message content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<MimeBody>,
}

impl Content {
    /// Content with the given headers and body; `size` is the body length in bytes.
    pub fn new(headers: BTreeMap<String, Vec<String>>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            headers,
            size: body.len() as u64,
            body,
            mime: None,
        }
    }
}

/// Multipart body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MimeBody {
    #[serde(default)]
    pub parts: Vec<Content>,
}

/// The message as received over SMTP, before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub helo: String,
}

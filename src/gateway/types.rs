//! Conversation and message types, plus the wire envelopes they arrive in

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned conversation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Conversation {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}

/// Who authored a message. The server only distinguishes `"bot"`; every other
/// tag (or none) is the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Sender {
    Bot,
    User(Option<String>),
}

impl Sender {
    pub fn is_bot(&self) -> bool {
        matches!(self, Sender::Bot)
    }
}

impl Default for Sender {
    fn default() -> Self {
        Sender::User(None)
    }
}

impl From<Option<String>> for Sender {
    fn from(tag: Option<String>) -> Self {
        match tag {
            Some(tag) if tag == "bot" => Sender::Bot,
            other => Sender::User(other),
        }
    }
}

impl From<Sender> for Option<String> {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Bot => Some("bot".to_string()),
            Sender::User(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// Parent conversation. The server usually omits it; the gateway fills it
    /// in from the request.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub sender: Sender,
    #[serde(default)]
    pub content: Option<String>,
    /// Attachment URL
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub original_file_name: Option<String>,
}

impl Message {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// One page of a paginated collection as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub per_page: Option<u32>,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, total_pages: u32) -> Self {
        Self {
            items,
            page,
            total_pages,
            per_page: None,
            total: None,
        }
    }
}

/// Accepts RFC 3339 and the offset-less `YYYY-MM-DDTHH:MM:SS[.fff]` form the
/// API emits for some records (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Wire envelopes
// ============================================================================

/// `{conversations|messages: [...], page, pages, per_page, status, total}`
#[derive(Debug, Deserialize)]
pub(crate) struct PageEnvelope<T> {
    #[serde(default = "Vec::new", alias = "conversations", alias = "messages")]
    pub items: Vec<T>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> PageEnvelope<T> {
    /// Missing `page` falls back to the page that was asked for, missing
    /// `pages` to an empty collection.
    pub fn into_page(self, requested_page: u32) -> Page<T> {
        Page {
            items: self.items,
            page: self.page.unwrap_or(requested_page),
            total_pages: self.pages.unwrap_or(0),
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    pub conversation_id: ConversationId,
    pub message: &'a str,
}

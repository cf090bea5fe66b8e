//! Platform data model
//!
//! Read-only copies of what the server sends us. Field names follow the
//! Mastodon REST entities so these deserialize straight from API responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An account on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    /// Handle, `user` for local accounts or `user@domain` for remote ones
    pub acct: String,

    /// Whether the platform flags this account as automated
    #[serde(default)]
    pub bot: bool,
}

/// Who can see a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    /// Public and unlisted posts are fair game for the corpus
    pub fn is_listed(self) -> bool {
        matches!(self, Visibility::Public | Visibility::Unlisted)
    }
}

/// A single post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub uri: String,

    /// HTML content
    #[serde(default)]
    pub content: String,

    pub visibility: Visibility,

    #[serde(default)]
    pub sensitive: bool,

    pub account: Account,

    /// Present when this status is a reshare of another one
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
}

impl Status {
    pub fn is_reshare(&self) -> bool {
        self.reblog.is_some()
    }
}

/// Notification kinds we care about; everything else lands in `Other`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Mention,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NotificationKind,

    pub account: Account,

    #[serde(default)]
    pub status: Option<Status>,
}

/// One item from the real-time event stream
#[derive(Debug, Clone)]
pub enum Event {
    /// Transport-level error reported by the stream
    Error(String),
    /// A status was deleted
    Delete(String),
    Notification(Box<Notification>),
    Update(Box<Status>),
    /// An event name we don't handle
    Unknown(String),
}

/// A status we're about to publish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDraft {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<String>,

    pub visibility: Visibility,
}

/// Instance metadata used for the login banner and streaming URL
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub uri: String,

    #[serde(default)]
    pub urls: Option<InstanceUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceUrls {
    #[serde(default)]
    pub streaming_api: Option<String>,
}

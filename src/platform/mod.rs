//! Platform access - REST calls and the streaming feed
//!
//! The core only talks to the server through the [`Platform`] trait, which
//! keeps the bootstrap and dispatch logic testable against in-memory fakes.

pub mod client;
pub mod stream;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Account, AccountId, Status, StatusDraft};

pub use client::MastodonClient;
pub use stream::{EventStream, StreamItem};

/// Opaque position within a paged listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

/// One page of a listing. `next` is `None` once there are no further pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

/// Operations the bot performs against the social network
#[async_trait]
pub trait Platform: Send + Sync {
    /// One page of accounts `id` follows
    async fn fetch_following(&self, id: &AccountId, cursor: Option<&Cursor>)
        -> Result<Page<Account>>;

    /// One page of accounts following `id`
    async fn fetch_followers(&self, id: &AccountId, cursor: Option<&Cursor>)
        -> Result<Page<Account>>;

    /// One page of statuses authored by `id`, newest first
    async fn fetch_statuses(&self, id: &AccountId, cursor: Option<&Cursor>)
        -> Result<Page<Status>>;

    async fn follow(&self, id: &AccountId) -> Result<()>;

    async fn post(&self, draft: &StatusDraft) -> Result<Status>;
}

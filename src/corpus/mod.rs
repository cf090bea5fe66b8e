//! Learned text corpus and post generation
//!
//! The dispatcher and history ingestion only see the [`Corpus`] and
//! [`TextGenerator`] traits. [`MarkovCorpus`] implements both.

pub mod html;
pub mod markov;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Account, AccountId, Status, StatusDraft};

pub use markov::MarkovCorpus;

#[async_trait]
pub trait Corpus: Send + Sync {
    /// Record a post's text. Returns false if `uri` was already ingested.
    /// A successful ingestion marks the corpus dirty.
    async fn ingest(&self, account: &AccountId, uri: &str, content: &str) -> bool;

    /// Write the corpus to durable storage
    async fn flush(&self) -> Result<()>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Compose a post as `me`. With a `source` the post is a reply to it.
    /// Returns `None` when there is nothing to generate from yet.
    async fn generate(&self, me: &Account, source: Option<&Status>) -> Option<StatusDraft>;
}

//! ebooks - autonomous Mastodon ebooks account
//!
//! Follows a set of accounts, learns from what they post, and posts
//! generated text every half hour and in reply to mentions.
//!
//! ## Components
//!
//! - **Accounts**: paginated following-set bootstrap and follow-back reconciliation
//! - **History**: corpus seeding for followed accounts, with a bounded backfill pool
//! - **Corpus**: Markov chain text corpus and post generation
//! - **Persist**: write-behind flushing of the corpus
//! - **Scheduler**: half-hour aligned post timer
//! - **Dispatch**: the event loop tying the stream and scheduler together

pub mod accounts;
pub mod app;
pub mod config;
pub mod corpus;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod model;
pub mod persist;
pub mod platform;
pub mod scheduler;

pub use app::run;
pub use config::Args;
pub use error::{BotError, Result};

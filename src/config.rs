//! Configuration for the ebooks bot
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{BotError, Result};

/// Mastodon ebooks bot
///
/// Learns from the accounts it follows, posts every half hour and
/// replies to mentions.
#[derive(Parser, Debug, Clone)]
#[command(name = "ebooks")]
#[command(about = "Autonomous Mastodon ebooks account")]
pub struct Args {
    /// Base URL of the Mastodon server
    #[arg(long, env = "EBOOKS_SERVER", default_value = "https://botsin.space")]
    pub server: String,

    /// Location of the Mastodon app credentials
    #[arg(long = "app", env = "EBOOKS_APP_CREDENTIALS", default_value = "clientcred.secret")]
    pub app_credentials: PathBuf,

    /// Location of the Mastodon user access token
    #[arg(long = "user", env = "EBOOKS_USER_CREDENTIALS", default_value = "usercred.secret")]
    pub user_credentials: PathBuf,

    /// Location of the corpus cache
    #[arg(long = "data", env = "EBOOKS_DATA", default_value = "ebooks.dat")]
    pub data: PathBuf,

    /// Automatically follow anyone who follows us.
    /// The environment form accepts true/false, yes/no, on/off and 1/0.
    #[arg(
        long,
        env = "EBOOKS_AUTO_FOLLOW",
        default_value = "false",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub auto_follow: bool,

    /// Number of workers downloading history for newly followed accounts
    #[arg(long, env = "EBOOKS_BACKFILL_WORKERS", default_value = "2")]
    pub backfill_workers: usize,

    /// Maximum pending history downloads
    #[arg(long, env = "EBOOKS_BACKFILL_QUEUE", default_value = "256")]
    pub backfill_queue: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Reject settings the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.server)
            .map_err(|e| BotError::Config(format!("server URL {:?}: {}", self.server, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BotError::Config(format!(
                "server URL must be http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.backfill_workers == 0 {
            return Err(BotError::Config("backfill-workers must be at least 1".into()));
        }
        if self.backfill_queue == 0 {
            return Err(BotError::Config("backfill-queue must be at least 1".into()));
        }
        Ok(())
    }

    /// Server URL without a trailing slash
    pub fn server_base(&self) -> &str {
        self.server.trim_end_matches('/')
    }
}

//! Order-2 word Markov chain corpus
//!
//! Stored as JSON at the configured data path. Writes go to a temp file
//! first and are renamed into place.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{html, Corpus, TextGenerator};
use crate::error::{BotError, Result};
use crate::model::{Account, AccountId, Status, StatusDraft, Visibility};
use crate::persist::DirtySignal;

/// Mastodon's default status length limit
pub const MAX_POST_CHARS: usize = 500;

const START: &str = "\u{2}";
const END: &str = "\u{3}";
const GENERATE_ATTEMPTS: usize = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Chain {
    /// URIs of every status already ingested
    sources: HashSet<String>,
    /// Ingested status count per author
    authors: HashMap<AccountId, u64>,
    /// Two-word prefix to the words seen after it
    links: HashMap<String, Vec<String>>,
}

impl Chain {
    fn learn(&mut self, words: &[&str]) {
        let mut a = START;
        let mut b = START;
        for word in words.iter().copied().chain(std::iter::once(END)) {
            self.links
                .entry(link_key(a, b))
                .or_default()
                .push(word.to_string());
            a = b;
            b = word;
        }
    }

    fn compose<R: Rng + ?Sized>(&self, rng: &mut R, budget: usize) -> Option<String> {
        let mut a = START.to_string();
        let mut b = START.to_string();
        let mut out = String::new();

        while let Some(next) = self
            .links
            .get(&link_key(&a, &b))
            .and_then(|successors| successors.choose(&mut *rng))
        {
            if next == END {
                break;
            }
            let extra = next.chars().count() + usize::from(!out.is_empty());
            if out.chars().count() + extra > budget {
                break;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(next);
            a = std::mem::replace(&mut b, next.clone());
        }

        (!out.is_empty()).then_some(out)
    }
}

fn link_key(a: &str, b: &str) -> String {
    format!("{}\u{1f}{}", a, b)
}

/// Words worth learning: no mentions, no links
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| !w.starts_with('@') && !w.contains("://"))
        .collect()
}

pub struct MarkovCorpus {
    path: PathBuf,
    chain: Mutex<Chain>,
    dirty: DirtySignal,
}

impl MarkovCorpus {
    /// Load the corpus at `path`, or start empty if there is none yet
    pub fn open(path: impl Into<PathBuf>, dirty: DirtySignal) -> Result<Self> {
        let path = path.into();
        let chain = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| BotError::Persist {
                path: path.clone(),
                reason: format!("corrupt corpus: {}", e),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No corpus cache yet, starting empty");
                Chain::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            chain: Mutex::new(chain),
            dirty,
        })
    }

    /// Number of statuses ingested so far
    pub async fn len(&self) -> usize {
        self.chain.lock().await.sources.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn draft(chain: &Chain, source: Option<&Status>) -> Option<StatusDraft> {
        let (prefix, in_reply_to_id, visibility) = match source {
            Some(status) => (
                format!("@{} ", status.account.acct),
                Some(status.id.clone()),
                match status.visibility {
                    Visibility::Public => Visibility::Unlisted,
                    other => other,
                },
            ),
            None => (String::new(), None, Visibility::Public),
        };

        let budget = MAX_POST_CHARS.saturating_sub(prefix.chars().count());
        let mut rng = rand::thread_rng();
        let text = (0..GENERATE_ATTEMPTS).find_map(|_| chain.compose(&mut rng, budget))?;

        Some(StatusDraft {
            status: format!("{}{}", prefix, text),
            in_reply_to_id,
            visibility,
        })
    }
}

#[async_trait]
impl Corpus for MarkovCorpus {
    async fn ingest(&self, account: &AccountId, uri: &str, content: &str) -> bool {
        let text = html::to_plain_text(content);
        {
            let mut chain = self.chain.lock().await;
            if !chain.sources.insert(uri.to_string()) {
                return false;
            }
            *chain.authors.entry(account.clone()).or_default() += 1;
            chain.learn(&tokenize(&text));
        }

        debug!(%account, uri, "Ingested status");
        self.dirty.mark();
        true
    }

    async fn flush(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&*self.chain.lock().await)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| BotError::Persist {
                path: self.path.clone(),
                reason: e.to_string(),
            })?
    }
}

#[async_trait]
impl TextGenerator for MarkovCorpus {
    async fn generate(&self, _me: &Account, source: Option<&Status>) -> Option<StatusDraft> {
        let chain = self.chain.lock().await;
        Self::draft(&chain, source)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let persist_err = |e: std::io::Error| BotError::Persist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    std::fs::write(&tmp, bytes).map_err(persist_err)?;
    std::fs::rename(&tmp, path).map_err(persist_err)?;
    Ok(())
}

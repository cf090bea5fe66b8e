//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ebooks::corpus::{Corpus, TextGenerator};
use ebooks::error::{BotError, Result};
use ebooks::model::{Account, AccountId, Status, StatusDraft, Visibility};
use ebooks::persist::DirtySignal;
use ebooks::platform::{Cursor, Page, Platform};

pub fn account(id: &str) -> Account {
    Account {
        id: id.into(),
        acct: format!("user{}", id),
        bot: false,
    }
}

pub fn bot_account(id: &str) -> Account {
    Account {
        bot: true,
        ..account(id)
    }
}

pub fn status(id: &str, author: &Account) -> Status {
    Status {
        id: id.to_string(),
        uri: format!("https://example.social/users/{}/statuses/{}", author.acct, id),
        content: format!("<p>post number {}</p>", id),
        visibility: Visibility::Public,
        sensitive: false,
        account: author.clone(),
        reblog: None,
    }
}

fn api_error(endpoint: &str) -> BotError {
    BotError::Api {
        endpoint: endpoint.to_string(),
        status: 503,
        body: "unavailable".into(),
    }
}

/// Serve `pages[n]` for cursor `n`; the first page has no cursor
fn page_of<T: Clone>(pages: &[Vec<T>], cursor: Option<&Cursor>) -> Page<T> {
    let index = cursor.map(|c| c.0.parse::<usize>().unwrap()).unwrap_or(0);
    let items = pages.get(index).cloned().unwrap_or_default();
    let next = (index + 1 < pages.len()).then(|| Cursor((index + 1).to_string()));
    Page { items, next }
}

#[derive(Debug, Default)]
pub struct Calls {
    pub following_pages: Vec<Option<Cursor>>,
    pub follower_pages: Vec<Option<Cursor>>,
    pub status_pages: Vec<(AccountId, Option<Cursor>)>,
    pub follows: Vec<AccountId>,
    pub posts: Vec<StatusDraft>,
}

#[derive(Default)]
pub struct MockPlatform {
    pub following: Vec<Vec<Account>>,
    pub followers: Vec<Vec<Account>>,
    pub statuses: HashMap<AccountId, Vec<Vec<Status>>>,
    pub fail_following_page: Option<usize>,
    pub fail_followers_page: Option<usize>,
    pub fail_statuses_for: HashSet<AccountId>,
    pub fail_follow: HashSet<AccountId>,
    pub fail_post: bool,
    pub calls: Mutex<Calls>,
}

impl MockPlatform {
    pub fn follows(&self) -> Vec<AccountId> {
        self.calls.lock().unwrap().follows.clone()
    }

    pub fn posts(&self) -> Vec<StatusDraft> {
        self.calls.lock().unwrap().posts.clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn fetch_following(&self, _id: &AccountId, cursor: Option<&Cursor>) -> Result<Page<Account>> {
        let mut calls = self.calls.lock().unwrap();
        calls.following_pages.push(cursor.cloned());
        if self.fail_following_page == Some(calls.following_pages.len() - 1) {
            return Err(api_error("following"));
        }
        Ok(page_of(&self.following, cursor))
    }

    async fn fetch_followers(&self, _id: &AccountId, cursor: Option<&Cursor>) -> Result<Page<Account>> {
        let mut calls = self.calls.lock().unwrap();
        calls.follower_pages.push(cursor.cloned());
        if self.fail_followers_page == Some(calls.follower_pages.len() - 1) {
            return Err(api_error("followers"));
        }
        Ok(page_of(&self.followers, cursor))
    }

    async fn fetch_statuses(&self, id: &AccountId, cursor: Option<&Cursor>) -> Result<Page<Status>> {
        self.calls
            .lock()
            .unwrap()
            .status_pages
            .push((id.clone(), cursor.cloned()));
        if self.fail_statuses_for.contains(id) {
            return Err(api_error("statuses"));
        }
        let pages = self.statuses.get(id).map(Vec::as_slice).unwrap_or_default();
        Ok(page_of(pages, cursor))
    }

    async fn follow(&self, id: &AccountId) -> Result<()> {
        self.calls.lock().unwrap().follows.push(id.clone());
        if self.fail_follow.contains(id) {
            return Err(api_error("follow"));
        }
        Ok(())
    }

    async fn post(&self, draft: &StatusDraft) -> Result<Status> {
        let mut calls = self.calls.lock().unwrap();
        calls.posts.push(draft.clone());
        if self.fail_post {
            return Err(api_error("statuses"));
        }
        let mut posted = status(&calls.posts.len().to_string(), &bot_account("0"));
        posted.content = draft.status.clone();
        Ok(posted)
    }
}

/// Corpus that remembers what it was given
#[derive(Default)]
pub struct RecordingCorpus {
    pub ingested: Mutex<Vec<(AccountId, String, String)>>,
    pub flushes: AtomicUsize,
    dirty: Option<DirtySignal>,
}

impl RecordingCorpus {
    pub fn with_signal(dirty: DirtySignal) -> Self {
        Self {
            dirty: Some(dirty),
            ..Default::default()
        }
    }

    pub fn ingested(&self) -> Vec<(AccountId, String, String)> {
        self.ingested.lock().unwrap().clone()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Corpus for RecordingCorpus {
    async fn ingest(&self, account: &AccountId, uri: &str, content: &str) -> bool {
        {
            let mut ingested = self.ingested.lock().unwrap();
            if ingested.iter().any(|(_, u, _)| u == uri) {
                return false;
            }
            ingested.push((account.clone(), uri.to_string(), content.to_string()));
        }
        if let Some(dirty) = &self.dirty {
            dirty.mark();
        }
        true
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Generator returning fixed text and recording what it was asked for
pub struct FixedGenerator {
    pub text: Option<String>,
    pub sources: Mutex<Vec<Option<String>>>,
}

impl FixedGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            text: None,
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn sources(&self) -> Vec<Option<String>> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _me: &Account, source: Option<&Status>) -> Option<StatusDraft> {
        self.sources
            .lock()
            .unwrap()
            .push(source.map(|s| s.id.clone()));
        let text = self.text.clone()?;
        Some(StatusDraft {
            status: text,
            in_reply_to_id: source.map(|s| s.id.clone()),
            visibility: Visibility::Public,
        })
    }
}

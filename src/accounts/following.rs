//! The set of accounts we follow

use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{Account, AccountId};
use crate::platform::Platform;

/// Accounts we follow, with constant-time membership and stable
/// insertion order. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct FollowingSet {
    by_id: HashMap<AccountId, Account>,
    order: Vec<AccountId>,
}

impl FollowingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Add or refresh an account. Returns true if it was not a member yet.
    pub fn insert(&mut self, account: Account) -> bool {
        let id = account.id.clone();
        let is_new = self.by_id.insert(id.clone(), account).is_none();
        if is_new {
            self.order.push(id);
        }
        is_new
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members in the order they were first added
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Owned copies of every member, for handing to background work
    pub fn snapshot(&self) -> Vec<Account> {
        self.accounts().cloned().collect()
    }
}

/// Page through everything `me` follows.
///
/// Any page failure aborts the whole build; a partial set is never returned.
pub async fn build_following_set(platform: &dyn Platform, me: &AccountId) -> Result<FollowingSet> {
    let mut set = FollowingSet::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = platform.fetch_following(me, cursor.as_ref()).await?;
        pages += 1;
        debug!(page = pages, accounts = page.items.len(), "Fetched following page");

        for account in page.items {
            set.insert(account);
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!(following = set.len(), pages, "Following set built");
    Ok(set)
}

//! History seeding for followed accounts
//!
//! At startup every followed account is seeded before the live loop runs.
//! Accounts followed later are queued to a small worker pool so the
//! dispatcher never waits on history downloads, and a follower surge can't
//! fan out into unbounded concurrent requests.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::corpus::Corpus;
use crate::error::Result;
use crate::model::{Account, Status};
use crate::platform::Platform;

/// Content rules for ingestion, without the following-set check
pub fn is_learnable(status: &Status) -> bool {
    !status.is_reshare() && status.visibility.is_listed() && !status.sensitive
}

/// Downloads an account's statuses into the corpus
#[derive(Clone)]
pub struct HistoryIngestor {
    platform: Arc<dyn Platform>,
    corpus: Arc<dyn Corpus>,
}

impl HistoryIngestor {
    pub fn new(platform: Arc<dyn Platform>, corpus: Arc<dyn Corpus>) -> Self {
        Self { platform, corpus }
    }

    /// Ingest `account`'s statuses, newest first, until one is already
    /// known or the listing ends. Returns the number ingested.
    pub async fn seed(&self, account: &Account) -> Result<usize> {
        let mut ingested = 0usize;
        let mut cursor = None;

        'pages: loop {
            let page = self
                .platform
                .fetch_statuses(&account.id, cursor.as_ref())
                .await?;

            for status in page.items.iter().filter(|s| is_learnable(s)) {
                if !self
                    .corpus
                    .ingest(&account.id, &status.uri, &status.content)
                    .await
                {
                    break 'pages;
                }
                ingested += 1;
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(account = %account.acct, ingested, "Seeded history");
        Ok(ingested)
    }

    /// Seed every account in order. A failure is logged and the next
    /// account is tried.
    pub async fn seed_all(&self, accounts: &[Account]) -> usize {
        let mut total = 0;
        for account in accounts {
            match self.seed(account).await {
                Ok(n) => total += n,
                Err(e) => warn!(account = %account.acct, error = %e, "Failed to download history"),
            }
        }
        info!(accounts = accounts.len(), statuses = total, "Initial history downloaded");
        total
    }
}

/// Non-blocking handle for queueing history downloads
#[derive(Debug, Clone)]
pub struct BackfillSender {
    tx: mpsc::Sender<Account>,
}

impl BackfillSender {
    pub fn new(tx: mpsc::Sender<Account>) -> Self {
        Self { tx }
    }

    /// Queue a download for a snapshot of `account`. Returns false if the
    /// queue is full or the pool is gone.
    pub fn enqueue(&self, account: Account) -> bool {
        match self.tx.try_send(account) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(account)) => {
                warn!(account = %account.acct, "Backfill queue full, skipping history download");
                false
            }
            Err(mpsc::error::TrySendError::Closed(account)) => {
                warn!(account = %account.acct, "Backfill pool stopped, skipping history download");
                false
            }
        }
    }
}

/// Fixed set of workers draining the backfill queue
pub struct BackfillPool;

impl BackfillPool {
    pub fn spawn(ingestor: HistoryIngestor, workers: usize, capacity: usize) -> BackfillSender {
        let (tx, rx) = mpsc::channel::<Account>(capacity);
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers {
            let ingestor = ingestor.clone();
            let rx = Arc::clone(&rx);
            tokio::spawn(async move {
                loop {
                    // Release the lock before downloading so other workers can pick up work
                    let next = rx.lock().await.recv().await;
                    let Some(account) = next else { break };

                    match ingestor.seed(&account).await {
                        Ok(n) => info!(worker, account = %account.acct, statuses = n, "History downloaded"),
                        Err(e) => warn!(worker, account = %account.acct, error = %e, "Failed to download history"),
                    }
                }
                debug!(worker, "Backfill worker finished");
            });
        }

        info!(workers, capacity, "Backfill pool started");
        BackfillSender::new(tx)
    }
}

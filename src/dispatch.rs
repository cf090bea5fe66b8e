//! Event dispatcher - the bot's main control loop
//!
//! Waits on the user stream and the half-hour scheduler and applies the
//! action policy to whichever is ready first:
//!
//! | Source | Condition | Action |
//! |---|---|---|
//! | error event | any | log |
//! | delete event | any | nothing |
//! | follow notification | auto-follow on | follow back, remember, queue history |
//! | mention notification | author is not a bot | post a generated reply |
//! | update event | passes [`is_ingestible`] | ingest into the corpus |
//! | unknown event | any | log |
//! | malformed event | any | fatal |
//! | scheduler tick | any | post a generated status |
//!
//! The dispatcher is the only owner of the following set once bootstrap is
//! done. Background history downloads get owned account snapshots.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accounts::FollowingSet;
use crate::corpus::{Corpus, TextGenerator};
use crate::error::{BotError, Result};
use crate::history::{is_learnable, BackfillSender};
use crate::model::{Account, Event, Notification, NotificationKind, Status};
use crate::platform::{Platform, StreamItem};
use crate::scheduler::{Scheduler, TickPhase};

/// Whether a streamed status belongs in the corpus: authored by someone we
/// follow, original content, public or unlisted, and not marked sensitive.
pub fn is_ingestible(status: &Status, following: &FollowingSet) -> bool {
    following.contains(&status.account.id) && is_learnable(status)
}

pub struct Dispatcher {
    me: Account,
    following: FollowingSet,
    auto_follow: bool,
    platform: Arc<dyn Platform>,
    corpus: Arc<dyn Corpus>,
    generator: Arc<dyn TextGenerator>,
    backfill: BackfillSender,
}

impl Dispatcher {
    pub fn new(
        me: Account,
        following: FollowingSet,
        auto_follow: bool,
        platform: Arc<dyn Platform>,
        corpus: Arc<dyn Corpus>,
        generator: Arc<dyn TextGenerator>,
        backfill: BackfillSender,
    ) -> Self {
        Self {
            me,
            following,
            auto_follow,
            platform,
            corpus,
            generator,
            backfill,
        }
    }

    pub fn following(&self) -> &FollowingSet {
        &self.following
    }

    /// Run until a fatal error. Stream loss counts as fatal.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<StreamItem>,
        mut scheduler: Scheduler,
    ) -> Result<()> {
        info!(following = self.following.len(), "Dispatcher running");

        loop {
            tokio::select! {
                item = events.recv() => match item {
                    Some(Ok(event)) => self.handle_event(event).await?,
                    Some(Err(e)) => {
                        error!(error = %e, "Undecodable event from stream");
                        return Err(e);
                    }
                    None => {
                        error!("User stream ended");
                        return Err(BotError::StreamClosed);
                    }
                },
                phase = scheduler.tick() => {
                    debug!(?phase, "Scheduled post due");
                    self.handle_tick(phase).await?;
                }
            }
        }
    }

    /// Apply the policy for one stream event. Only fatal conditions are
    /// returned as errors.
    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Error(message) => {
                warn!(%message, "Stream error event");
            }
            Event::Delete(_) => {}
            Event::Notification(notification) => {
                self.handle_notification(*notification).await?;
            }
            Event::Update(status) => {
                if is_ingestible(&status, &self.following) {
                    self.corpus
                        .ingest(&status.account.id, &status.uri, &status.content)
                        .await;
                }
            }
            Event::Unknown(kind) => {
                warn!(%kind, "Unexpected event type");
            }
        }
        Ok(())
    }

    async fn handle_notification(&mut self, notification: Notification) -> Result<()> {
        match notification.kind {
            NotificationKind::Follow if self.auto_follow => {
                let account = notification.account;
                if let Err(e) = self.platform.follow(&account.id).await {
                    warn!(account = %account.acct, error = %e, "Failed to follow back");
                } else {
                    info!(account = %account.acct, "Followed back");
                }
                self.following.insert(account.clone());
                self.backfill.enqueue(account);
            }
            NotificationKind::Mention if !notification.account.bot => {
                let Some(status) = notification.status else {
                    warn!(account = %notification.account.acct, "Mention without a status");
                    return Ok(());
                };
                self.publish(Some(&status)).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Post an autonomous status for a scheduler tick
    pub async fn handle_tick(&mut self, phase: TickPhase) -> Result<()> {
        if phase == TickPhase::FirstBoundary {
            info!("Reached first half-hour boundary, posting every 30 minutes");
        }
        self.publish(None).await
    }

    async fn publish(&self, source: Option<&Status>) -> Result<()> {
        let Some(draft) = self.generator.generate(&self.me, source).await else {
            warn!("Corpus is empty, skipping post");
            return Ok(());
        };

        match self.platform.post(&draft).await {
            Ok(posted) => {
                info!(uri = %posted.uri, reply = source.is_some(), "Posted status");
                Ok(())
            }
            Err(e) => {
                match source {
                    Some(status) => error!(uri = %status.uri, error = %e, "Error replying to mention"),
                    None => error!(error = %e, "Error posting status"),
                }
                Err(e)
            }
        }
    }
}

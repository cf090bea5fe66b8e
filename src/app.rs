//! Startup sequence and top-level supervision

use std::sync::Arc;
use tracing::{error, info};

use crate::accounts::{build_following_set, reconcile_followers};
use crate::config::Args;
use crate::corpus::MarkovCorpus;
use crate::credentials::Credentials;
use crate::dispatch::Dispatcher;
use crate::error::{BotError, Result};
use crate::history::{BackfillPool, HistoryIngestor};
use crate::persist::{DirtySignal, PersistenceTrigger};
use crate::platform::{EventStream, MastodonClient, Platform};
use crate::scheduler::Scheduler;

/// Bootstrap, then run the dispatcher until something fatal happens
pub async fn run(args: Args) -> Result<()> {
    let credentials = Credentials::load(&args.app_credentials, &args.user_credentials)?;
    info!(client_id = %credentials.app.client_id, "Loaded credentials");

    let client = MastodonClient::new(args.server_base(), &credentials.user.access_token)?;
    let instance = client.instance().await?;
    let me = client.verify_credentials().await?;
    info!("Logged in as {}@{}", me.acct, instance.uri);

    // Connect before bootstrapping so nothing posted meanwhile is missed
    let streaming_api = instance.urls.as_ref().and_then(|u| u.streaming_api.as_deref());
    let stream_url =
        EventStream::user_stream_url(client.base_url(), streaming_api, client.access_token())?;
    let events = EventStream::connect(stream_url).await?;

    let platform: Arc<dyn Platform> = Arc::new(client);

    let mut following = build_following_set(platform.as_ref(), &me.id).await?;
    let accounts = if args.auto_follow {
        reconcile_followers(platform.as_ref(), &me.id, &mut following).await?
    } else {
        following.snapshot()
    };

    let (dirty, dirty_rx) = DirtySignal::channel();
    let corpus = Arc::new(MarkovCorpus::open(&args.data, dirty)?);
    let statuses = corpus.len().await;
    info!(path = %corpus.path().display(), statuses, "Corpus loaded");

    let ingestor = HistoryIngestor::new(platform.clone(), corpus.clone());
    ingestor.seed_all(&accounts).await;

    let persistence = PersistenceTrigger::spawn(corpus.clone(), dirty_rx);
    let backfill = BackfillPool::spawn(ingestor, args.backfill_workers, args.backfill_queue);

    let dispatcher = Dispatcher::new(
        me,
        following,
        args.auto_follow,
        platform,
        corpus.clone(),
        corpus,
        backfill,
    );

    tokio::select! {
        result = dispatcher.run(events, Scheduler::new()) => result,
        joined = persistence => match joined {
            Ok(Ok(())) => {
                error!("Persistence task stopped unexpectedly");
                Err(BotError::Persist {
                    path: args.data.clone(),
                    reason: "persistence task stopped".into(),
                })
            }
            Ok(Err(e)) => Err(e),
            Err(e) => Err(BotError::Persist {
                path: args.data.clone(),
                reason: e.to_string(),
            }),
        },
    }
}

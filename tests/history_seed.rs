//! History seeding and backfill pool tests

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{account, status, MockPlatform, RecordingCorpus};
use ebooks::corpus::Corpus;
use ebooks::history::{BackfillPool, BackfillSender, HistoryIngestor};
use ebooks::model::{AccountId, Visibility};

fn ingestor(platform: &Arc<MockPlatform>, corpus: &Arc<RecordingCorpus>) -> HistoryIngestor {
    HistoryIngestor::new(platform.clone(), corpus.clone())
}

#[tokio::test]
async fn test_seed_pages_through_learnable_statuses() {
    let alice = account("1");
    let mut private = status("3", &alice);
    private.visibility = Visibility::Direct;
    let mut boosted = status("4", &alice);
    boosted.reblog = Some(Box::new(status("99", &account("9"))));

    let platform = Arc::new(MockPlatform {
        statuses: HashMap::from([(
            alice.id.clone(),
            vec![
                vec![status("6", &alice), private, boosted],
                vec![status("2", &alice)],
            ],
        )]),
        ..Default::default()
    });
    let corpus = Arc::new(RecordingCorpus::default());

    let n = ingestor(&platform, &corpus).seed(&alice).await.unwrap();

    assert_eq!(n, 2);
    let uris: Vec<_> = corpus.ingested().into_iter().map(|(_, uri, _)| uri).collect();
    assert_eq!(
        uris,
        vec![status("6", &alice).uri, status("2", &alice).uri]
    );
}

#[tokio::test]
async fn test_seed_stops_at_known_status() {
    let alice = account("1");
    let platform = Arc::new(MockPlatform {
        statuses: HashMap::from([(
            alice.id.clone(),
            vec![
                vec![status("9", &alice), status("8", &alice)],
                vec![status("7", &alice)],
            ],
        )]),
        ..Default::default()
    });
    let corpus = Arc::new(RecordingCorpus::default());
    let known = status("8", &alice);
    corpus.ingest(&alice.id, &known.uri, &known.content).await;

    let n = ingestor(&platform, &corpus).seed(&alice).await.unwrap();

    assert_eq!(n, 1);
    // Second page never requested
    assert_eq!(platform.calls.lock().unwrap().status_pages.len(), 1);
}

#[tokio::test]
async fn test_seed_all_continues_past_failures() {
    let alice = account("1");
    let bob = account("2");
    let platform = Arc::new(MockPlatform {
        statuses: HashMap::from([(bob.id.clone(), vec![vec![status("1", &bob)]])]),
        fail_statuses_for: [alice.id.clone()].into_iter().collect(),
        ..Default::default()
    });
    let corpus = Arc::new(RecordingCorpus::default());

    let total = ingestor(&platform, &corpus).seed_all(&[alice, bob]).await;

    assert_eq!(total, 1);
    assert_eq!(corpus.ingested()[0].0, AccountId::from("2"));
}

#[tokio::test]
async fn test_backfill_pool_downloads_queued_accounts() {
    let carol = account("3");
    let platform = Arc::new(MockPlatform {
        statuses: HashMap::from([(
            carol.id.clone(),
            vec![vec![status("1", &carol), status("2", &carol)]],
        )]),
        ..Default::default()
    });
    let corpus = Arc::new(RecordingCorpus::default());

    let sender = BackfillPool::spawn(ingestor(&platform, &corpus), 2, 4);
    assert!(sender.enqueue(carol));

    for _ in 0..100 {
        if corpus.ingested().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(corpus.ingested().len(), 2);
}

#[tokio::test]
async fn test_full_backfill_queue_drops_request() {
    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    let sender = BackfillSender::new(tx);

    assert!(sender.enqueue(account("1")));
    assert!(!sender.enqueue(account("2")));
}

//! Write-behind persistence for the corpus
//!
//! Ingestion marks the corpus dirty through a [`DirtySignal`]; a single
//! background task flushes on each signal. The channel holds one pending
//! signal, so a burst of mutations during a flush collapses into exactly
//! one follow-up flush, and only one flush is ever in flight.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::corpus::Corpus;
use crate::error::Result;

/// Sending half of the dirty signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirtySignal {
    tx: mpsc::Sender<()>,
}

impl DirtySignal {
    /// A signal and the receiver the persistence task drains
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Note that the corpus changed. Never blocks; if a flush is already
    /// pending this signal is folded into it.
    pub fn mark(&self) {
        if let Err(mpsc::error::TrySendError::Closed(_)) = self.tx.try_send(()) {
            debug!("Persistence task gone, dirty signal dropped");
        }
    }
}

pub struct PersistenceTrigger;

impl PersistenceTrigger {
    /// Flush `corpus` each time a dirty signal arrives.
    ///
    /// The task ends with an error on the first failed flush, and ends
    /// cleanly once every `DirtySignal` is dropped.
    pub fn spawn(corpus: Arc<dyn Corpus>, mut dirty: mpsc::Receiver<()>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            info!("Persistence task started");
            let mut flushes = 0u64;
            while dirty.recv().await.is_some() {
                if let Err(e) = corpus.flush().await {
                    error!(error = %e, "Corpus flush failed");
                    return Err(e);
                }
                flushes += 1;
                debug!(flushes, "Corpus flushed");
            }
            info!(flushes, "Persistence task finished");
            Ok(())
        })
    }
}

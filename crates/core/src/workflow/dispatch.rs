//! Ordered event dispatch.
//!
//! Events are sharded by source document onto worker queues. One worker
//! handles one event at a time, so events for a document run in submission
//! order while different documents proceed in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::controller::BudgetController;
use super::types::{LifecycleEvent, Outcome};
use crate::error::{BudgetControlError, BudgetResult};
use crate::ledger::DocumentRef;

/// Pending jobs per worker before `submit` waits.
const QUEUE_DEPTH: usize = 256;

struct Job {
    event: LifecycleEvent,
    reply: oneshot::Sender<BudgetResult<Outcome>>,
}

/// The eventual outcome of a submitted event.
pub struct PendingOutcome(oneshot::Receiver<BudgetResult<Outcome>>);

impl PendingOutcome {
    /// Waits for the worker to finish the event.
    pub async fn wait(self) -> BudgetResult<Outcome> {
        self.0
            .await
            .map_err(|_| BudgetControlError::Dispatch("worker dropped the reply".to_string()))?
    }
}

/// Sharded queue in front of a [`BudgetController`].
pub struct EventDispatcher {
    shards: Vec<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Starts `workers` worker tasks on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(controller: Arc<BudgetController>, workers: usize) -> Self {
        let (shards, workers): (Vec<_>, Vec<_>) = (0..workers.max(1))
            .map(|shard| {
                let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
                let handle = tokio::spawn(run_worker(shard, Arc::clone(&controller), rx));
                (tx, handle)
            })
            .unzip();
        Self { shards, workers }
    }

    /// Number of worker shards.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard a document's events are routed to. Stable for the process lifetime.
    #[must_use]
    pub fn shard_for(&self, document: &DocumentRef) -> usize {
        let mut hasher = DefaultHasher::new();
        document.hash(&mut hasher);
        let count = u64::try_from(self.shards.len()).unwrap_or(u64::MAX);
        usize::try_from(hasher.finish() % count).unwrap_or(0)
    }

    /// Queues an event behind earlier events for the same document.
    pub async fn submit(&self, event: LifecycleEvent) -> BudgetResult<PendingOutcome> {
        let shard = self.shard_for(event.document());
        let (reply, receiver) = oneshot::channel();
        self.shards[shard]
            .send(Job { event, reply })
            .await
            .map_err(|_| BudgetControlError::Dispatch(format!("worker {shard} has stopped")))?;
        Ok(PendingOutcome(receiver))
    }

    /// Queues an event and waits for its outcome.
    pub async fn dispatch(&self, event: LifecycleEvent) -> BudgetResult<Outcome> {
        self.submit(event).await?.wait().await
    }

    /// Stops accepting events and waits for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.shards);
        for worker in self.workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "Dispatcher worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    shard: usize,
    controller: Arc<BudgetController>,
    mut jobs: mpsc::Receiver<Job>,
) {
    debug!(shard, "Dispatcher worker started");
    while let Some(Job { event, reply }) = jobs.recv().await {
        let name = event.name();
        let document = event.document().clone();
        let controller = Arc::clone(&controller);

        let result = tokio::task::spawn_blocking(move || controller.handle(&event))
            .await
            .unwrap_or_else(|err| {
                Err(BudgetControlError::Dispatch(format!(
                    "handler for {name} failed: {err}"
                )))
            });

        if let Err(err) = &result {
            debug!(shard, event = name, %document, code = err.error_code(), "Event failed");
        }
        if reply.send(result).is_err() {
            debug!(shard, event = name, %document, "Submitter went away before the reply");
        }
    }
    debug!(shard, "Dispatcher worker stopped");
}

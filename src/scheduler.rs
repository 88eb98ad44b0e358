//! Bounded-concurrency task group for item downloads.
//!
//! `submit` suspends the caller until a slot is free, then spawns the task;
//! the slot is returned when the task finishes, whether it succeeded,
//! failed, or panicked. `drain` is the explicit join point: it waits for
//! every admitted task and reports how many failed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct BoundedScheduler {
    slots: Arc<Semaphore>,
    tasks: JoinSet<anyhow::Result<()>>,
}

impl BoundedScheduler {
    /// A scheduler that runs at most `concurrent` tasks at once.
    pub fn new(concurrent: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(concurrent.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Admit `task`, suspending until one of the slots is free.
    ///
    /// The permit moves into the spawned task, so completion of any kind
    /// releases the slot and wakes at most one waiting submitter.
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("scheduler semaphore is never closed");
        self.tasks.spawn(async move {
            let _slot = permit;
            task.await
        });
    }

    /// Wait for every admitted task to finish; returns the number that
    /// failed. Failures are logged here, not propagated, so one bad item
    /// cannot abort the rest of the batch.
    pub async fn drain(&mut self) -> u64 {
        let mut failed = 0;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::error!("download failed: {:#}", e);
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("download task panicked: {}", e);
                }
            }
        }
        failed
    }
}

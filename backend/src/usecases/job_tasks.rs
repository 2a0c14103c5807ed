use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Background processing tasks keyed by job id.
///
/// Spawning never waits: each task acquires its permit once it is running, so at most
/// `max_concurrent_jobs` jobs do work at the same time while the rest queue on the
/// semaphore.
pub struct JobTaskRegistry {
    permits: Arc<Semaphore>,
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl JobTaskRegistry {
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn<F>(&self, job_id: Uuid, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(%job_id, "job_tasks: pool closed before the job could start");
                    return;
                }
            };

            work.await;
        });

        let mut tasks = self.lock();
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(job_id, handle);
        debug!(%job_id, in_flight = tasks.len(), "job_tasks: job scheduled");
    }

    /// Awaits the job's task. Returns false when no task is tracked for the id, either
    /// because it never existed or because a later spawn already reaped it.
    pub async fn wait(&self, job_id: Uuid) -> bool {
        let handle = self.lock().remove(&job_id);

        match handle {
            Some(handle) => {
                join(job_id, handle).await;
                true
            }
            None => false,
        }
    }

    pub async fn wait_all(&self) {
        let handles: Vec<(Uuid, JoinHandle<()>)> = self.lock().drain().collect();

        for (job_id, handle) in handles {
            join(job_id, handle).await;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn join(job_id: Uuid, handle: JoinHandle<()>) {
    if let Err(err) = handle.await {
        // A panicked task never reached its terminal update; the job stays `processing`.
        error!(%job_id, error = %err, "job_tasks: job task aborted");
    }
}

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Runs validation jobs in the background, at most `max_concurrent_runs` at a time.
/// Jobs beyond the limit wait for a slot; nothing is rejected or cancelled.
#[derive(Clone)]
pub struct Dispatcher {
    rt: Handle,
    limiter: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(rt: Handle, max_concurrent_runs: usize) -> Self {
        Self {
            rt,
            limiter: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
        }
    }

    pub fn spawn<F>(&self, job: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let limiter = self.limiter.clone();
        self.rt.spawn(async move {
            // The semaphore is never closed, so this only waits.
            let _permit = limiter.acquire_owned().await.ok();
            job.await
        })
    }

    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }
}

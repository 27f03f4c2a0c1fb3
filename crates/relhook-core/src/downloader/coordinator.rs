//! Concurrent fan-out over fetch targets.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::fetcher::{FetchOutcome, Fetcher};
use crate::error::MirrorError;
use crate::selector::FetchTarget;

/// Runs one fetch per target and waits for all of them
pub struct DownloadCoordinator {
    fetcher: Arc<dyn Fetcher>,
    limit: Option<Arc<Semaphore>>,
}

impl DownloadCoordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher, limit: None }
    }

    /// Cap the number of fetches in flight; `None` means no cap
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.limit = max_concurrent
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Fetch every target and return exactly one outcome per target.
    ///
    /// With `report_only` nothing is downloaded and every target is returned as a
    /// listed outcome. Otherwise all targets are dispatched at once and the call
    /// returns when each of them has finished, successfully or not. Outcomes come
    /// back in completion order.
    pub async fn run_all(&self, targets: Vec<FetchTarget>, report_only: bool) -> Vec<FetchOutcome> {
        if report_only {
            return targets
                .into_iter()
                .map(|target| {
                    log::info!("Resolved {}: {}", target, target.location());
                    FetchOutcome::reported(target)
                })
                .collect();
        }

        log::info!("Dispatching {} downloads", targets.len());

        // Slot per dispatched target, emptied when its outcome comes back
        let mut pending: Vec<Option<FetchTarget>> = targets.iter().cloned().map(Some).collect();
        let mut tasks = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let limit = self.limit.clone();
            tasks.spawn(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                (index, fetcher.fetch(target).await)
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len());

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if pending.get_mut(index).and_then(Option::take).is_some() {
                        outcomes.push(outcome);
                    }
                }
                Err(e) => log::error!("Download task failed: {}", e),
            }
        }

        // Targets whose task died before reporting
        for target in pending.into_iter().flatten() {
            log::warn!("No outcome reported for {}", target);
            outcomes.push(FetchOutcome::failed(
                target,
                MirrorError::Task("download task terminated without reporting".to_string()),
            ));
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        log::info!("Downloads complete: {} succeeded, {} failed", outcomes.len() - failed, failed);

        outcomes
    }
}

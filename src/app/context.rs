use std::sync::{Arc, Mutex};

use crate::domain::FreshnessCursor;
use crate::fetcher::batch::{BatchFetcher, DEFAULT_WORKERS};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::session::{FeedSession, SessionConfig};
use crate::watcher::FreshnessWatcher;

pub struct AppContext {
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub batch: BatchFetcher,
    pub cursor: Arc<Mutex<FreshnessCursor>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::with_workers(DEFAULT_WORKERS)
    }

    pub fn with_workers(workers: usize) -> Self {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new());
        Self::with_fetcher_and_workers(fetcher, workers)
    }

    /// Build a context around an arbitrary fetcher. This is the seam the
    /// tests use to run sessions and watchers without a network.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_fetcher_and_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_fetcher_and_workers(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        workers: usize,
    ) -> Self {
        let batch = BatchFetcher::with_workers(fetcher.clone(), workers);
        Self {
            fetcher,
            batch,
            cursor: Arc::new(Mutex::new(FreshnessCursor::default())),
        }
    }

    pub fn session(&self) -> FeedSession {
        FeedSession::new(
            self.fetcher.clone(),
            self.batch.clone(),
            self.cursor.clone(),
            SessionConfig::default(),
        )
    }

    pub fn watcher(&self) -> FreshnessWatcher {
        FreshnessWatcher::new(self.fetcher.clone(), self.cursor.clone())
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

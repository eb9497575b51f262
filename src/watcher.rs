//! Background freshness polling.
//!
//! Re-fetches the head id of both listings on a fixed interval and raises
//! a notification message whenever either has changed since the last
//! observation. Best effort only: a failed fetch is logged and skipped
//! for that tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;

use crate::domain::{FeedKind, FreshnessCursor, Listing};
use crate::fetcher::Fetcher;

/// Interval between freshness checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct FreshnessWatcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    cursor: Arc<Mutex<FreshnessCursor>>,
    interval: Duration,
}

impl FreshnessWatcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, cursor: Arc<Mutex<FreshnessCursor>>) -> Self {
        Self::with_interval(fetcher, cursor, POLL_INTERVAL)
    }

    pub fn with_interval(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        cursor: Arc<Mutex<FreshnessCursor>>,
        interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            cursor,
            interval,
        }
    }

    /// Record the current head for `kind` without raising a
    /// notification, so the first tick doesn't announce content that
    /// predates startup.
    pub async fn seed(&self, kind: FeedKind) {
        match self.fetcher.listing(kind).await {
            Ok(ids) => {
                if let (Some(&head), Ok(mut cursor)) = (ids.first(), self.cursor.lock()) {
                    cursor.record(kind, head);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to seed {} cursor: {}", kind, e);
            }
        }
    }

    /// One freshness check: re-fetch both heads concurrently, update the
    /// cursor, and compose a message for whatever changed.
    pub async fn tick(&self) -> Option<String> {
        let (news, jobs) = tokio::join!(
            self.fetcher.listing(FeedKind::NewStories),
            self.fetcher.listing(FeedKind::JobStories),
        );

        let mut lines = Vec::new();
        self.observe(FeedKind::NewStories, news, &mut lines);
        self.observe(FeedKind::JobStories, jobs, &mut lines);

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn observe(
        &self,
        kind: FeedKind,
        fetched: crate::app::Result<Vec<u64>>,
        lines: &mut Vec<String>,
    ) {
        match fetched {
            Ok(ids) => {
                let listing = Listing { kind, ids };
                let Some(head) = listing.head() else {
                    return;
                };
                let changed = match self.cursor.lock() {
                    Ok(mut cursor) => cursor.record(kind, head),
                    Err(_) => false,
                };
                if changed {
                    lines.push(format!("🔔 {}", kind.freshness_message()));
                }
            }
            Err(e) => {
                tracing::warn!("Freshness check for {} failed: {}", kind, e);
            }
        }
    }

    /// Poll until the receiving side goes away.
    pub async fn run(self, tx: mpsc::Sender<String>) {
        let mut timer = interval(self.interval);
        timer.tick().await; // The first tick fires immediately; skip it.

        loop {
            timer.tick().await;
            if let Some(message) = self.tick().await {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::MockFetcher;

    fn watcher_over(mock: Arc<MockFetcher>) -> (FreshnessWatcher, Arc<Mutex<FreshnessCursor>>) {
        let cursor = Arc::new(Mutex::new(FreshnessCursor::default()));
        (FreshnessWatcher::new(mock, cursor.clone()), cursor)
    }

    #[tokio::test]
    async fn test_unchanged_heads_raise_nothing() {
        let mock = Arc::new(MockFetcher::new());
        mock.set_listing(FeedKind::NewStories, vec![10, 9]);
        mock.set_listing(FeedKind::JobStories, vec![20]);
        let (watcher, cursor) = watcher_over(mock);

        cursor.lock().unwrap().record(FeedKind::NewStories, 10);
        cursor.lock().unwrap().record(FeedKind::JobStories, 20);

        assert_eq!(watcher.tick().await, None);
        assert_eq!(cursor.lock().unwrap().get(FeedKind::NewStories), Some(10));
    }

    #[tokio::test]
    async fn test_changed_head_updates_cursor_and_notifies() {
        let mock = Arc::new(MockFetcher::new());
        mock.set_listing(FeedKind::NewStories, vec![11]);
        mock.set_listing(FeedKind::JobStories, vec![20]);
        let (watcher, cursor) = watcher_over(mock.clone());

        cursor.lock().unwrap().record(FeedKind::NewStories, 10);
        cursor.lock().unwrap().record(FeedKind::JobStories, 20);

        let message = watcher.tick().await.unwrap();
        assert!(message.contains("New stories available!"));
        assert!(!message.contains("New jobs posted!"));
        assert_eq!(cursor.lock().unwrap().get(FeedKind::NewStories), Some(11));

        // Same heads again: quiet.
        assert_eq!(watcher.tick().await, None);
    }

    #[tokio::test]
    async fn test_both_heads_changed_composes_both_lines() {
        let mock = Arc::new(MockFetcher::new());
        mock.set_listing(FeedKind::NewStories, vec![2]);
        mock.set_listing(FeedKind::JobStories, vec![4]);
        let (watcher, cursor) = watcher_over(mock);

        cursor.lock().unwrap().record(FeedKind::NewStories, 1);
        cursor.lock().unwrap().record(FeedKind::JobStories, 3);

        let message = watcher.tick().await.unwrap();
        assert!(message.contains("New stories available!"));
        assert!(message.contains("New jobs posted!"));
    }

    #[tokio::test]
    async fn test_fetch_failure_suppresses_that_tick_only() {
        let mock = Arc::new(MockFetcher::new());
        mock.fail_listing(FeedKind::NewStories);
        mock.set_listing(FeedKind::JobStories, vec![20]);
        let (watcher, cursor) = watcher_over(mock.clone());

        cursor.lock().unwrap().record(FeedKind::JobStories, 20);

        // News failed, jobs unchanged: nothing, and the news cursor is
        // untouched so the change still reports once the fetch recovers.
        assert_eq!(watcher.tick().await, None);
        assert_eq!(cursor.lock().unwrap().get(FeedKind::NewStories), None);

        mock.set_listing(FeedKind::NewStories, vec![30]);
        let message = watcher.tick().await.unwrap();
        assert!(message.contains("New stories available!"));
    }

    #[tokio::test]
    async fn test_seed_is_quiet() {
        let mock = Arc::new(MockFetcher::new());
        mock.set_listing(FeedKind::NewStories, vec![1]);
        mock.set_listing(FeedKind::JobStories, vec![20]);
        let (watcher, cursor) = watcher_over(mock);

        watcher.seed(FeedKind::JobStories).await;
        assert_eq!(cursor.lock().unwrap().get(FeedKind::JobStories), Some(20));

        // First tick after seeding: jobs unchanged, news is new.
        let message = watcher.tick().await.unwrap();
        assert!(message.contains("New stories available!"));
        assert!(!message.contains("New jobs posted!"));
    }
}

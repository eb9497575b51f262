use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::domain::Item;
use crate::fetcher::Fetcher;

pub const DEFAULT_WORKERS: usize = 10;

/// Fetches a batch of items concurrently with settle-all semantics: every
/// fetch in the batch is awaited, failures degrade to `None` instead of
/// aborting siblings, and results come back in request order.
#[derive(Clone)]
pub struct BatchFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl BatchFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn fetch_items(&self, ids: &[u64]) -> Vec<(u64, Option<Item>)> {
        let mut handles = Vec::with_capacity(ids.len());

        for &id in ids {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");

                match fetcher.item(id).await {
                    Ok(raw) => Some(Item::from(raw)),
                    Err(e) => {
                        tracing::warn!("Failed to fetch item {}: {}", id, e);
                        None
                    }
                }
            }));
        }

        let settled = join_all(handles).await;

        ids.iter()
            .zip(settled)
            .map(|(&id, joined)| match joined {
                Ok(item) => (id, item),
                Err(e) => {
                    tracing::error!("Task join error for item {}: {}", id, e);
                    (id, None)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::MockFetcher;

    #[test]
    fn test_results_in_request_order_despite_failures() {
        let mock = MockFetcher::new();
        mock.insert_story(3, vec![]);
        mock.insert_story(1, vec![]);
        mock.fail_item(2);

        let batch = BatchFetcher::new(Arc::new(mock));
        let results = tokio_test::block_on(batch.fetch_items(&[3, 2, 1]));

        let ids: Vec<u64> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(results[0].1.is_some());
        assert!(results[1].1.is_none());
        assert!(results[2].1.is_some());
    }

    #[test]
    fn test_empty_batch() {
        let batch = BatchFetcher::new(Arc::new(MockFetcher::new()));
        let results = tokio_test::block_on(batch.fetch_items(&[]));
        assert!(results.is_empty());
    }
}

pub mod batch;
pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FeedKind, RawItem};

/// Read-only access to the item API: a listing of ids per feed kind, and
/// single items by id.
#[async_trait]
pub trait Fetcher {
    async fn listing(&self, kind: FeedKind) -> Result<Vec<u64>>;
    async fn item(&self, id: u64) -> Result<RawItem>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::app::{KindlingError, Result};
    use crate::domain::{FeedKind, RawItem};
    use crate::fetcher::Fetcher;

    /// In-memory fetcher used by session and watcher tests.
    #[derive(Default)]
    pub struct MockFetcher {
        listings: Mutex<HashMap<FeedKind, Vec<u64>>>,
        items: Mutex<HashMap<u64, RawItem>>,
        failing_items: Mutex<HashSet<u64>>,
        failing_listings: Mutex<HashSet<FeedKind>>,
        listing_calls: AtomicUsize,
        item_calls: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_listing(&self, kind: FeedKind, ids: Vec<u64>) {
            self.failing_listings.lock().unwrap().remove(&kind);
            self.listings.lock().unwrap().insert(kind, ids);
        }

        pub fn fail_listing(&self, kind: FeedKind) {
            self.failing_listings.lock().unwrap().insert(kind);
            self.listings.lock().unwrap().remove(&kind);
        }

        pub fn insert(&self, raw: RawItem) {
            self.items.lock().unwrap().insert(raw.id, raw);
        }

        pub fn insert_story(&self, id: u64, kids: Vec<u64>) {
            self.insert(RawItem {
                id,
                kind: Some("story".into()),
                title: Some(format!("Story {id}")),
                by: Some(format!("user{id}")),
                time: Some(1_700_000_000),
                kids,
                ..RawItem::default()
            });
        }

        pub fn insert_comment(&self, id: u64, kids: Vec<u64>) {
            self.insert(RawItem {
                id,
                kind: Some("comment".into()),
                text: Some(format!("comment text {id}")),
                by: Some(format!("user{id}")),
                time: Some(1_700_000_000),
                kids,
                ..RawItem::default()
            });
        }

        pub fn insert_poll(&self, id: u64, parts: Vec<u64>) {
            self.insert(RawItem {
                id,
                kind: Some("poll".into()),
                title: Some(format!("Poll {id}")),
                by: Some("pollster".into()),
                time: Some(1_700_000_000),
                parts,
                ..RawItem::default()
            });
        }

        pub fn insert_pollopt(&self, id: u64, score: i64) {
            self.insert(RawItem {
                id,
                kind: Some("pollopt".into()),
                text: Some(format!("Option {id}")),
                score: Some(score),
                time: Some(1_700_000_000),
                ..RawItem::default()
            });
        }

        pub fn insert_deleted(&self, id: u64) {
            self.insert(RawItem {
                id,
                deleted: true,
                ..RawItem::default()
            });
        }

        pub fn fail_item(&self, id: u64) {
            self.failing_items.lock().unwrap().insert(id);
        }

        pub fn listing_calls(&self) -> usize {
            self.listing_calls.load(Ordering::SeqCst)
        }

        pub fn item_calls(&self) -> usize {
            self.item_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn listing(&self, kind: FeedKind) -> Result<Vec<u64>> {
            self.listing_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_listings.lock().unwrap().contains(&kind) {
                return Err(KindlingError::Other(format!("mock: {kind} unavailable")));
            }
            self.listings
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .ok_or_else(|| KindlingError::Other(format!("mock: no listing for {kind}")))
        }

        async fn item(&self, id: u64) -> Result<RawItem> {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_items.lock().unwrap().contains(&id) {
                return Err(KindlingError::Other(format!("mock: item {id} unavailable")));
            }
            self.items
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| KindlingError::Other(format!("mock: no item {id}")))
        }
    }
}

pub mod thread;

pub use thread::{CommentNode, CommentPath, CommentThread};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::{FeedKind, FreshnessCursor, Item, Listing, PAGE_SIZE};
use crate::fetcher::batch::BatchFetcher;
use crate::fetcher::Fetcher;

/// The one hardcoded poll shown by the poll demo.
pub const POLL_DEMO_ID: u64 = 126809;

/// Pause before filling a batch so the loading indicator stays visible.
pub const BATCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub page_size: usize,
    pub batch_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            batch_delay: BATCH_DELAY,
        }
    }
}

/// A post's place in the content view. Slots are inserted in listing
/// order as `Pending` and filled in whatever order the fetches settle.
#[derive(Debug, Clone)]
pub struct PostSlot {
    pub id: u64,
    generation: u64,
    pub state: SlotState,
}

#[derive(Debug, Clone)]
pub enum SlotState {
    Pending,
    Loaded(PostView),
    Failed,
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub item: Item,
    pub thread: CommentThread,
    pub poll_options: Vec<PollOptionRow>,
}

impl PostView {
    pub fn new(item: Item) -> Self {
        let thread = CommentThread::new(item.kids.clone());
        Self {
            item,
            thread,
            poll_options: Vec::new(),
        }
    }
}

/// A rendered poll option; `None` means the fetch failed.
#[derive(Debug, Clone)]
pub struct PollOptionRow {
    pub id: u64,
    pub item: Option<Item>,
}

/// The feed controller: owns the selected feed, its listing, the ordered
/// post slots, and the comment trees hanging off them.
///
/// A single `loading` flag gates every fetch-triggering operation
/// (check-and-skip, no queueing). Each view reset bumps `generation`;
/// batch results are applied only to slots of the generation they were
/// fetched for, so results of a superseded load are discarded rather
/// than written into a cleared view.
pub struct FeedSession {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    batch: BatchFetcher,
    cursor: Arc<Mutex<FreshnessCursor>>,
    config: SessionConfig,
    current: Option<FeedKind>,
    ids: Vec<u64>,
    slots: Vec<PostSlot>,
    loading: bool,
    generation: u64,
    placeholder: Option<String>,
}

impl FeedSession {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        batch: BatchFetcher,
        cursor: Arc<Mutex<FreshnessCursor>>,
        config: SessionConfig,
    ) -> Self {
        Self {
            fetcher,
            batch,
            cursor,
            config,
            current: None,
            ids: Vec::new(),
            slots: Vec::new(),
            loading: false,
            generation: 0,
            placeholder: None,
        }
    }

    pub fn current(&self) -> Option<FeedKind> {
        self.current
    }

    pub fn slots(&self) -> &[PostSlot] {
        &self.slots
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Content-area message shown instead of posts, e.g. after a listing
    /// fetch failure.
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Whether the listing still has ids without a slot.
    pub fn has_more(&self) -> bool {
        self.slots.len() < self.ids.len()
    }

    /// The rendered comment node a non-empty path points at.
    pub fn comment_at(&self, path: &CommentPath) -> Option<&CommentNode> {
        let (&last, parent_trail) = path.trail.split_last()?;
        let slot = self.slots.get(path.post)?;
        match &slot.state {
            SlotState::Loaded(view) => view.thread.descend(parent_trail)?.children.get(last),
            _ => None,
        }
    }

    pub fn thread_at(&self, path: &CommentPath) -> Option<&CommentThread> {
        let slot = self.slots.get(path.post)?;
        match &slot.state {
            SlotState::Loaded(view) => view.thread.descend(&path.trail),
            _ => None,
        }
    }

    fn thread_at_mut(&mut self, path: &CommentPath) -> Option<&mut CommentThread> {
        let slot = self.slots.get_mut(path.post)?;
        match &mut slot.state {
            SlotState::Loaded(view) => view.thread.descend_mut(&path.trail),
            _ => None,
        }
    }

    /// Switch to `kind`: clear the view, fetch the listing, record its
    /// head id as the freshness cursor, and render the first page.
    /// Selecting the already-current feed is a no-op.
    pub async fn select_feed(&mut self, kind: FeedKind) {
        if self.current == Some(kind) {
            return;
        }
        self.current = Some(kind);
        self.begin_view();
        self.loading = true;

        match self.fetcher.listing(kind).await {
            Ok(ids) => {
                let listing = Listing { kind, ids };
                if let Some(head) = listing.head() {
                    if let Ok(mut cursor) = self.cursor.lock() {
                        cursor.record(kind, head);
                    }
                }
                self.ids = listing.ids;
                let first: Vec<u64> = self
                    .ids
                    .iter()
                    .take(self.config.page_size)
                    .copied()
                    .collect();
                self.render_batch(first).await;
            }
            Err(e) => {
                tracing::warn!("Failed to load {} listing: {}", kind, e);
                self.ids.clear();
                self.placeholder = Some("Failed to load posts".to_string());
            }
        }

        self.loading = false;
    }

    /// Render the next page of unrendered listing ids. Skipped while a
    /// load is in flight or when everything is already rendered.
    pub async fn load_more(&mut self) {
        if self.loading {
            return;
        }
        let rendered = self.slots.len();
        if rendered >= self.ids.len() {
            return;
        }
        let next: Vec<u64> = self.ids[rendered..]
            .iter()
            .take(self.config.page_size)
            .copied()
            .collect();

        self.loading = true;
        self.render_batch(next).await;
        self.loading = false;
    }

    /// Fetch the fixed demo poll and its options. Mutually exclusive
    /// with the story feeds: the view is cleared and the selected feed
    /// reset, so a later `select_feed` always reloads.
    pub async fn poll_demo(&mut self) {
        self.current = None;
        self.begin_view();
        self.ids.clear();
        self.loading = true;

        match self.fetcher.item(POLL_DEMO_ID).await {
            Ok(raw) => {
                let item = Item::from(raw);
                let parts = item.poll_parts().to_vec();
                let mut view = PostView::new(item);
                if !parts.is_empty() {
                    view.poll_options = self
                        .batch
                        .fetch_items(&parts)
                        .await
                        .into_iter()
                        .map(|(id, item)| PollOptionRow { id, item })
                        .collect();
                }
                self.slots.push(PostSlot {
                    id: POLL_DEMO_ID,
                    generation: self.generation,
                    state: SlotState::Loaded(view),
                });
            }
            Err(e) => {
                tracing::warn!("Failed to load poll demo: {}", e);
                self.placeholder = Some("Failed to load poll".to_string());
            }
        }

        self.loading = false;
    }

    /// Expand or collapse the thread at `path`. Expanding fetches the
    /// first page of children; collapsing discards whatever was fetched.
    pub async fn toggle_comments(&mut self, path: &CommentPath) {
        let Some(thread) = self.thread_at_mut(path) else {
            return;
        };
        if thread.expanded {
            thread.collapse();
            return;
        }
        thread.expanded = true;
        self.fetch_next_comment_page(path).await;
    }

    /// Fetch the next page of children into the thread at `path`.
    pub async fn load_more_comments(&mut self, path: &CommentPath) {
        self.fetch_next_comment_page(path).await;
    }

    async fn fetch_next_comment_page(&mut self, path: &CommentPath) {
        if self.loading {
            return;
        }
        let generation = self.generation;
        let Some(thread) = self.thread_at_mut(path) else {
            return;
        };
        let ids = thread.next_batch();
        if ids.is_empty() {
            return;
        }

        self.loading = true;
        let results = self.batch.fetch_items(&ids).await;
        self.loading = false;

        if generation != self.generation {
            return;
        }
        let Some(thread) = self.thread_at_mut(path) else {
            return;
        };
        for (id, item) in results {
            thread.children.push(CommentNode::new(id, item));
        }
    }

    async fn render_batch(&mut self, ids: Vec<u64>) {
        if ids.is_empty() {
            return;
        }
        let generation = self.generation;
        for &id in &ids {
            self.slots.push(PostSlot {
                id,
                generation,
                state: SlotState::Pending,
            });
        }

        tokio::time::sleep(self.config.batch_delay).await;

        let results = self.batch.fetch_items(&ids).await;
        self.apply_batch(generation, results);
    }

    /// Fill pending slots with batch results. Results carrying a stale
    /// generation belong to a superseded load and are dropped.
    pub(crate) fn apply_batch(&mut self, generation: u64, results: Vec<(u64, Option<Item>)>) {
        if generation != self.generation {
            tracing::debug!(
                "Discarding batch from superseded load (generation {} != {})",
                generation,
                self.generation
            );
            return;
        }
        for (id, item) in results {
            let slot = self.slots.iter_mut().find(|s| {
                s.id == id && s.generation == generation && matches!(s.state, SlotState::Pending)
            });
            if let Some(slot) = slot {
                slot.state = match item {
                    Some(item) => SlotState::Loaded(PostView::new(item)),
                    None => SlotState::Failed,
                };
            }
        }
    }

    fn begin_view(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.slots.clear();
        self.placeholder = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::MockFetcher;

    fn session_over(mock: Arc<MockFetcher>) -> FeedSession {
        FeedSession::new(
            mock.clone(),
            BatchFetcher::new(mock),
            Arc::new(Mutex::new(FreshnessCursor::default())),
            SessionConfig {
                page_size: PAGE_SIZE,
                batch_delay: Duration::ZERO,
            },
        )
    }

    fn mock_with_stories(n: u64) -> Arc<MockFetcher> {
        let mock = MockFetcher::new();
        let ids: Vec<u64> = (1..=n).collect();
        for &id in &ids {
            mock.insert_story(id, vec![]);
        }
        mock.set_listing(FeedKind::NewStories, ids);
        Arc::new(mock)
    }

    fn loaded_ids(session: &FeedSession) -> Vec<u64> {
        session.slots().iter().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn test_first_page_is_min_n_10() {
        let mock = mock_with_stories(25);
        let mut session = session_over(mock.clone());

        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(loaded_ids(&session), (1..=10).collect::<Vec<u64>>());
        assert!(session.has_more());

        let mock = mock_with_stories(4);
        let mut session = session_over(mock);
        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(session.slots().len(), 4);
        assert!(!session.has_more());
    }

    #[tokio::test]
    async fn test_reselecting_current_feed_is_a_noop() {
        let mock = mock_with_stories(5);
        let mut session = session_over(mock.clone());

        session.select_feed(FeedKind::NewStories).await;
        let listing_calls = mock.listing_calls();
        let item_calls = mock.item_calls();

        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(mock.listing_calls(), listing_calls);
        assert_eq!(mock.item_calls(), item_calls);
        assert_eq!(session.slots().len(), 5);
    }

    #[tokio::test]
    async fn test_feed_switch_replaces_view() {
        let mock = mock_with_stories(3);
        for id in [100, 101] {
            mock.insert_story(id, vec![]);
        }
        mock.set_listing(FeedKind::JobStories, vec![100, 101]);
        let mut session = session_over(mock);

        session.select_feed(FeedKind::NewStories).await;
        session.select_feed(FeedKind::JobStories).await;
        assert_eq!(loaded_ids(&session), vec![100, 101]);
        assert_eq!(session.current(), Some(FeedKind::JobStories));
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_placeholder() {
        let mock = MockFetcher::new();
        mock.fail_listing(FeedKind::NewStories);
        let mut session = session_over(Arc::new(mock));

        session.select_feed(FeedKind::NewStories).await;
        assert!(session.slots().is_empty());
        assert_eq!(session.placeholder(), Some("Failed to load posts"));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_select_feed_records_freshness_cursor() {
        let mock = mock_with_stories(3);
        let cursor = Arc::new(Mutex::new(FreshnessCursor::default()));
        let mut session = FeedSession::new(
            mock.clone(),
            BatchFetcher::new(mock),
            cursor.clone(),
            SessionConfig {
                page_size: PAGE_SIZE,
                batch_delay: Duration::ZERO,
            },
        );

        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(cursor.lock().unwrap().get(FeedKind::NewStories), Some(1));
    }

    #[tokio::test]
    async fn test_load_more_pages_through_the_listing() {
        let mock = mock_with_stories(25);
        let mut session = session_over(mock.clone());

        session.select_feed(FeedKind::NewStories).await;
        session.load_more().await;
        assert_eq!(session.slots().len(), 20);
        session.load_more().await;
        assert_eq!(session.slots().len(), 25);
        assert!(!session.has_more());

        let item_calls = mock.item_calls();
        session.load_more().await;
        assert_eq!(session.slots().len(), 25);
        assert_eq!(mock.item_calls(), item_calls);
    }

    #[tokio::test]
    async fn test_load_more_skipped_while_loading() {
        let mock = mock_with_stories(25);
        let mut session = session_over(mock.clone());
        session.select_feed(FeedKind::NewStories).await;

        let item_calls = mock.item_calls();
        session.loading = true;
        session.load_more().await;
        assert_eq!(session.slots().len(), 10);
        assert_eq!(mock.item_calls(), item_calls);
    }

    #[tokio::test]
    async fn test_failed_item_degrades_to_failed_slot_in_order() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1, 2, 3]);
        mock.insert_story(1, vec![]);
        mock.fail_item(2);
        mock.insert_story(3, vec![]);
        let mut session = session_over(Arc::new(mock));

        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(loaded_ids(&session), vec![1, 2, 3]);
        assert!(matches!(session.slots()[0].state, SlotState::Loaded(_)));
        assert!(matches!(session.slots()[1].state, SlotState::Failed));
        assert!(matches!(session.slots()[2].state, SlotState::Loaded(_)));
    }

    #[tokio::test]
    async fn test_stale_batch_results_are_discarded() {
        let mock = mock_with_stories(3);
        for id in [100, 101] {
            mock.insert_story(id, vec![]);
        }
        mock.set_listing(FeedKind::JobStories, vec![100, 101]);
        let mut session = session_over(mock.clone());

        session.select_feed(FeedKind::NewStories).await;
        let stale_generation = session.generation;
        session.select_feed(FeedKind::JobStories).await;

        let raw = crate::domain::RawItem {
            id: 100,
            kind: Some("story".into()),
            title: Some("stale".into()),
            ..Default::default()
        };
        session.apply_batch(stale_generation, vec![(100, Some(Item::from(raw)))]);

        // The job slot for id 100 keeps its own fill, not the stale one.
        match &session.slots()[0].state {
            SlotState::Loaded(view) => assert_eq!(view.item.display_title(), "Story 100"),
            other => panic!("unexpected slot state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_comment_toggle_expand_collapse() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1]);
        let kids: Vec<u64> = (101..=125).collect();
        mock.insert_story(1, kids.clone());
        for &id in &kids {
            mock.insert_comment(id, vec![]);
        }
        let mut session = session_over(Arc::new(mock));
        session.select_feed(FeedKind::NewStories).await;

        let path = CommentPath::post(0);
        session.toggle_comments(&path).await;
        {
            let thread = session.thread_at(&path).unwrap();
            assert!(thread.expanded);
            assert_eq!(thread.children.len(), 10);
            assert!(thread.has_more());
        }

        session.load_more_comments(&path).await;
        assert_eq!(session.thread_at(&path).unwrap().children.len(), 20);
        session.load_more_comments(&path).await;
        {
            let thread = session.thread_at(&path).unwrap();
            assert_eq!(thread.children.len(), 25);
            assert!(!thread.has_more());
        }

        session.toggle_comments(&path).await;
        let thread = session.thread_at(&path).unwrap();
        assert!(!thread.expanded);
        assert!(thread.children.is_empty());
    }

    #[tokio::test]
    async fn test_reexpanding_refetches_children() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1]);
        mock.insert_story(1, vec![11, 12]);
        mock.insert_comment(11, vec![]);
        mock.insert_comment(12, vec![]);
        let mock = Arc::new(mock);
        let mut session = session_over(mock.clone());
        session.select_feed(FeedKind::NewStories).await;

        let path = CommentPath::post(0);
        session.toggle_comments(&path).await;
        let calls_after_first = mock.item_calls();
        session.toggle_comments(&path).await;
        session.toggle_comments(&path).await;
        assert_eq!(mock.item_calls(), calls_after_first + 2);
        assert_eq!(session.thread_at(&path).unwrap().children.len(), 2);
    }

    #[tokio::test]
    async fn test_nested_comment_expansion() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1]);
        mock.insert_story(1, vec![11]);
        mock.insert_comment(11, vec![111]);
        mock.insert_comment(111, vec![]);
        let mut session = session_over(Arc::new(mock));
        session.select_feed(FeedKind::NewStories).await;

        let root = CommentPath::post(0);
        session.toggle_comments(&root).await;
        let nested = root.child(0);
        session.toggle_comments(&nested).await;

        let thread = session.thread_at(&nested).unwrap();
        assert_eq!(thread.children.len(), 1);
        assert_eq!(thread.children[0].id, 111);
    }

    #[tokio::test]
    async fn test_failed_comment_renders_as_placeholder_node() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1]);
        mock.insert_story(1, vec![11, 12]);
        mock.insert_comment(11, vec![]);
        mock.fail_item(12);
        let mut session = session_over(Arc::new(mock));
        session.select_feed(FeedKind::NewStories).await;

        let path = CommentPath::post(0);
        session.toggle_comments(&path).await;
        let thread = session.thread_at(&path).unwrap();
        assert_eq!(thread.children.len(), 2);
        assert!(thread.children[0].item.is_some());
        assert!(thread.children[1].item.is_none());
    }

    #[tokio::test]
    async fn test_poll_demo_renders_options_with_scores() {
        let mock = MockFetcher::new();
        mock.insert_poll(POLL_DEMO_ID, vec![201, 202, 203]);
        mock.insert_pollopt(201, 50);
        mock.insert_pollopt(202, 30);
        mock.fail_item(203);
        let mut session = session_over(Arc::new(mock));

        session.poll_demo().await;
        assert_eq!(session.current(), None);
        assert_eq!(session.slots().len(), 1);
        match &session.slots()[0].state {
            SlotState::Loaded(view) => {
                assert_eq!(view.poll_options.len(), 3);
                assert_eq!(view.poll_options[0].item.as_ref().unwrap().score(), 50);
                assert!(view.poll_options[2].item.is_none());
            }
            other => panic!("unexpected slot state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_demo_failure_leaves_placeholder() {
        let mock = MockFetcher::new();
        mock.fail_item(POLL_DEMO_ID);
        let mut session = session_over(Arc::new(mock));

        session.poll_demo().await;
        assert!(session.slots().is_empty());
        assert_eq!(session.placeholder(), Some("Failed to load poll"));
    }

    #[tokio::test]
    async fn test_poll_demo_then_feed_always_reloads() {
        let mock = mock_with_stories(2);
        mock.insert_poll(POLL_DEMO_ID, vec![]);
        let mut session = session_over(mock.clone());

        session.select_feed(FeedKind::NewStories).await;
        session.poll_demo().await;
        session.select_feed(FeedKind::NewStories).await;
        assert_eq!(session.slots().len(), 2);
        assert_eq!(session.current(), Some(FeedKind::NewStories));
    }

    #[tokio::test]
    async fn test_deleted_item_loads_as_deleted() {
        let mock = MockFetcher::new();
        mock.set_listing(FeedKind::NewStories, vec![1]);
        mock.insert_deleted(1);
        let mut session = session_over(Arc::new(mock));

        session.select_feed(FeedKind::NewStories).await;
        match &session.slots()[0].state {
            SlotState::Loaded(view) => assert!(view.item.is_deleted()),
            other => panic!("unexpected slot state: {other:?}"),
        }
    }
}

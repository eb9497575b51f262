use std::fmt;

/// The two listings the client browses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    NewStories,
    JobStories,
}

impl FeedKind {
    /// Path segment under the API base, e.g. `newstories` in
    /// `/v0/newstories.json`.
    pub fn path(&self) -> &'static str {
        match self {
            FeedKind::NewStories => "newstories",
            FeedKind::JobStories => "jobstories",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedKind::NewStories => "News",
            FeedKind::JobStories => "Jobs",
        }
    }

    /// Message shown when this listing's head id changes.
    pub fn freshness_message(&self) -> &'static str {
        match self {
            FeedKind::NewStories => "New stories available!",
            FeedKind::JobStories => "New jobs posted!",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Ordered id sequence for one feed kind, replaced wholesale on every
/// feed switch.
#[derive(Debug, Clone)]
pub struct Listing {
    pub kind: FeedKind,
    pub ids: Vec<u64>,
}

impl Listing {
    pub fn head(&self) -> Option<u64> {
        self.ids.first().copied()
    }
}

/// Last head id observed per listing, used to detect new content between
/// poll ticks. Held only in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessCursor {
    news: Option<u64>,
    jobs: Option<u64>,
}

impl FreshnessCursor {
    pub fn get(&self, kind: FeedKind) -> Option<u64> {
        match kind {
            FeedKind::NewStories => self.news,
            FeedKind::JobStories => self.jobs,
        }
    }

    /// Record the observed head id, returning whether it differed from
    /// the previous observation. A first observation counts as a change.
    pub fn record(&mut self, kind: FeedKind, head: u64) -> bool {
        let slot = match kind {
            FeedKind::NewStories => &mut self.news,
            FeedKind::JobStories => &mut self.jobs,
        };
        let changed = *slot != Some(head);
        *slot = Some(head);
        changed
    }
}

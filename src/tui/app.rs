use std::time::{Duration, Instant};

use ratatui::widgets::ListState;

use crate::domain::PAGE_SIZE;
use crate::session::{CommentPath, CommentThread, FeedSession, SlotState};

/// How long a freshness notification stays on screen.
pub const NOTIFICATION_VISIBLE: Duration = Duration::from_secs(3);

/// Minimum gap between scroll-triggered load-more checks.
pub const LOAD_MORE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Selection distance from the bottom that counts as "near the end".
pub const LOAD_MORE_MARGIN: usize = 3;

/// One selectable line group in the content list, addressing back into
/// the session's view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Post(usize),
    PollOption { post: usize, option: usize },
    CommentToggle(CommentPath),
    Comment(CommentPath),
    LoadMoreComments(CommentPath),
}

#[derive(Debug)]
pub struct Notification {
    pub message: String,
    shown_at: Instant,
}

impl Notification {
    pub fn new(message: String) -> Self {
        Self {
            message,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTIFICATION_VISIBLE
    }
}

/// UI-local state: the flattened row list, selection, notification popup,
/// and the load-more debounce clock.
pub struct TuiApp {
    pub rows: Vec<Row>,
    pub selected: usize,
    pub list_state: ListState,
    pub notification: Option<Notification>,
    pub should_quit: bool,
    /// Drawn as loading while an awaited operation is in progress.
    pub busy: bool,
    /// True while the poll demo occupies the content area.
    pub poll_mode: bool,
    last_load_check: Option<Instant>,
}

impl TuiApp {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            rows: Vec::new(),
            selected: 0,
            list_state,
            notification: None,
            should_quit: false,
            busy: false,
            poll_mode: false,
            last_load_check: None,
        }
    }

    /// Rebuild the row list from the session and clamp the selection.
    pub fn refresh_rows(&mut self, session: &FeedSession) {
        self.rows = flatten(session);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
        self.list_state.select(if self.rows.is_empty() {
            None
        } else {
            Some(self.selected)
        });
    }

    pub fn reset_selection(&mut self) {
        self.selected = 0;
        self.list_state.select(Some(0));
        self.last_load_check = None;
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn move_down(&mut self) {
        if !self.rows.is_empty() && self.selected < self.rows.len() - 1 {
            self.selected += 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn next_page(&mut self) {
        let max_index = self.rows.len().saturating_sub(1);
        self.selected = (self.selected + PAGE_SIZE).min(max_index);
        self.list_state.select(Some(self.selected));
    }

    pub fn prev_page(&mut self) {
        self.selected = self.selected.saturating_sub(PAGE_SIZE);
        self.list_state.select(Some(self.selected));
    }

    pub fn notify(&mut self, message: String) {
        self.notification = Some(Notification::new(message));
    }

    pub fn dismiss_expired_notification(&mut self) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired()) {
            self.notification = None;
        }
    }

    /// The terminal stand-in for the near-bottom scroll check: true when
    /// the selection sits within the last few rows, more listing ids
    /// remain, no load is in flight, and the debounce window has passed.
    pub fn should_load_more(&mut self, session: &FeedSession) -> bool {
        if session.is_loading() || !session.has_more() || self.rows.is_empty() {
            return false;
        }
        if self.selected + LOAD_MORE_MARGIN < self.rows.len() {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = self.last_load_check {
            if now.duration_since(last) < LOAD_MORE_DEBOUNCE {
                return false;
            }
        }
        self.last_load_check = Some(now);
        true
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the session's post slots and expanded comment trees into the
/// ordered row list the content pane renders.
pub fn flatten(session: &FeedSession) -> Vec<Row> {
    let mut rows = Vec::new();
    for (index, slot) in session.slots().iter().enumerate() {
        rows.push(Row::Post(index));
        if let SlotState::Loaded(view) = &slot.state {
            for option in 0..view.poll_options.len() {
                rows.push(Row::PollOption { post: index, option });
            }
            if view.thread.has_kids() {
                let path = CommentPath::post(index);
                rows.push(Row::CommentToggle(path.clone()));
                if view.thread.expanded {
                    flatten_thread(&view.thread, &path, &mut rows);
                }
            }
        }
    }
    rows
}

fn flatten_thread(thread: &CommentThread, path: &CommentPath, rows: &mut Vec<Row>) {
    for (index, child) in thread.children.iter().enumerate() {
        let child_path = path.child(index);
        rows.push(Row::Comment(child_path.clone()));
        if child.thread.has_kids() {
            rows.push(Row::CommentToggle(child_path.clone()));
            if child.thread.expanded {
                flatten_thread(&child.thread, &child_path, rows);
            }
        }
    }
    if thread.has_more() {
        rows.push(Row::LoadMoreComments(path.clone()));
    }
}

//! # Kindling
//!
//! A terminal Hacker News reader.
//!
//! ## Architecture
//!
//! Kindling follows a modular pipeline architecture:
//!
//! ```text
//! Fetcher → Domain → Session → UI
//! ```
//!
//! - [`fetcher`]: HTTP client for the Hacker News item API
//! - [`domain`]: Unified item/listing models with an explicit item kind
//! - [`session`]: The feed controller (listing, post slots, comment trees)
//! - [`watcher`]: Background polling for new stories and jobs
//! - [`tui`]: Terminal user interface built with ratatui
//!
//! ## Quick Start
//!
//! ```bash
//! # Browse interactively
//! kindling tui
//!
//! # Print the first page of new stories
//! kindling news
//!
//! # Watch for new content from a plain terminal
//! kindling watch
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetcher,
/// the batch fetcher, and the shared freshness cursor.
pub mod app;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `tui` - Launch the TUI (default)
/// - `news` / `jobs` - Print the first page of a listing
/// - `poll` - Fetch and print the demo poll
/// - `watch` - Foreground freshness watch
pub mod cli;

/// Configuration management for the TUI.
///
/// Loads from `~/.config/kindling/config.toml`, supporting:
/// - Custom colors (named or hex)
/// - Custom keybindings
pub mod config;

/// Core domain models.
///
/// - [`Item`](domain::Item) / [`ItemKind`](domain::ItemKind): API records
///   with an explicit kind tag
/// - [`FeedKind`](domain::FeedKind) / [`Listing`](domain::Listing): the
///   browsable listings
/// - [`FreshnessCursor`](domain::FreshnessCursor): last-seen head ids
/// - [`ChildPager`](domain::ChildPager): paged child-id batches
pub mod domain;

/// HTTP fetching against the Hacker News API.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait over listings and items
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based
///   implementation
/// - [`BatchFetcher`](fetcher::batch::BatchFetcher): Concurrent settle-all
///   item fetching with a semaphore
pub mod fetcher;

/// The feed controller.
///
/// [`FeedSession`](session::FeedSession) owns the selected feed, its
/// listing, the ordered post slots, and the lazily expanded comment
/// trees; it is UI-agnostic and fully testable against a mock fetcher.
pub mod session;

/// Terminal user interface.
///
/// Single content pane over the flattened post/comment rows, with a tab
/// bar, a transient notification popup, and a status bar. Keybindings:
/// j/k navigate, 1/2/3 switch feeds, Enter toggles comments, o opens in
/// browser, q quits.
pub mod tui;

/// Background freshness polling.
///
/// [`FreshnessWatcher`](watcher::FreshnessWatcher) re-fetches both
/// listings' head ids every ten seconds and raises a notification when
/// either changed.
pub mod watcher;

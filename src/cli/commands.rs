use chrono::Local;
use tokio::time::interval;

use crate::app::{AppContext, Result};
use crate::domain::{FeedKind, Item};
use crate::session::SlotState;
use crate::watcher::POLL_INTERVAL;

pub async fn show_listing(ctx: &AppContext, kind: FeedKind) -> Result<()> {
    let mut session = ctx.session();
    session.select_feed(kind).await;

    if let Some(message) = session.placeholder() {
        println!("{}", message);
        return Ok(());
    }

    for slot in session.slots() {
        match &slot.state {
            SlotState::Loaded(view) => {
                print_post(&view.item);
                if view.thread.has_kids() {
                    println!("({} comments)", view.item.kids.len());
                }
            }
            SlotState::Failed => println!("Failed to load post {}", slot.id),
            SlotState::Pending => {}
        }
        println!();
    }

    Ok(())
}

pub async fn poll_demo(ctx: &AppContext) -> Result<()> {
    let mut session = ctx.session();
    session.poll_demo().await;

    if let Some(message) = session.placeholder() {
        println!("{}", message);
        return Ok(());
    }

    for slot in session.slots() {
        if let SlotState::Loaded(view) = &slot.state {
            print_post(&view.item);
            for option in &view.poll_options {
                match &option.item {
                    Some(item) => {
                        println!("➡️ {} ({})", item.display_text(), item.score());
                    }
                    None => println!("Failed to load poll option {}", option.id),
                }
            }
        }
    }

    Ok(())
}

/// Foreground freshness watch: seed both cursors, then report changes on
/// every poll tick until interrupted.
pub async fn watch(ctx: &AppContext) -> Result<()> {
    let watcher = ctx.watcher();
    watcher.seed(FeedKind::NewStories).await;
    watcher.seed(FeedKind::JobStories).await;

    println!(
        "Watching for new stories and jobs every {}s (Ctrl+C to stop)",
        POLL_INTERVAL.as_secs()
    );

    let mut timer = interval(POLL_INTERVAL);
    timer.tick().await; // Skip the first immediate tick.

    loop {
        timer.tick().await;
        if let Some(message) = watcher.tick().await {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            for line in message.lines() {
                println!("[{}] {}", timestamp, line);
            }
        }
    }
}

fn print_post(item: &Item) {
    if item.is_deleted() {
        println!("[ UNAVAILABLE CONTENT ]");
        return;
    }
    println!("{}", item.display_title());
    println!(
        "By: {}  At: {}",
        item.display_author(),
        item.time
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown time".to_string())
    );
    println!("{}", item.display_text());
    if let Some(url) = item.url() {
        println!("Read More: {}", url);
    }
}

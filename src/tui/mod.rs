pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::FeedKind;
use crate::session::{FeedSession, SlotState};

use self::app::{Row, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, config).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>, config: Arc<Config>) -> Result<()> {
    let mut session = ctx.session();
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));

    // Background freshness polling. The jobs head is seeded quietly up
    // front; the news head is recorded by the initial feed load below.
    let (tx, mut rx) = mpsc::channel(8);
    let watcher = ctx.watcher();
    watcher.seed(FeedKind::JobStories).await;
    tokio::spawn(watcher.run(tx));

    // Initial load.
    draw_busy(terminal, &mut tui_app, &session, &config)?;
    session.select_feed(FeedKind::NewStories).await;
    tui_app.busy = false;

    loop {
        tui_app.refresh_rows(&session);
        terminal.draw(|frame| layout::render(frame, &mut tui_app, &session, &config.colors))?;

        while let Ok(message) = rx.try_recv() {
            tui_app.notify(message);
        }
        tui_app.dismiss_expired_notification();

        match event_handler.next()? {
            AppEvent::Key(key) => match config.keybindings.get_action(&key) {
                Action::Quit => {
                    tui_app.should_quit = true;
                }
                Action::MoveUp => {
                    tui_app.move_up();
                }
                Action::MoveDown => {
                    tui_app.move_down();
                }
                Action::NextPage => {
                    tui_app.next_page();
                }
                Action::PrevPage => {
                    tui_app.prev_page();
                }
                Action::NewsFeed => {
                    if session.current() != Some(FeedKind::NewStories) {
                        tui_app.poll_mode = false;
                        draw_busy(terminal, &mut tui_app, &session, &config)?;
                        session.select_feed(FeedKind::NewStories).await;
                        tui_app.busy = false;
                        tui_app.reset_selection();
                    }
                }
                Action::JobsFeed => {
                    if session.current() != Some(FeedKind::JobStories) {
                        tui_app.poll_mode = false;
                        draw_busy(terminal, &mut tui_app, &session, &config)?;
                        session.select_feed(FeedKind::JobStories).await;
                        tui_app.busy = false;
                        tui_app.reset_selection();
                    }
                }
                Action::PollDemo => {
                    tui_app.poll_mode = true;
                    draw_busy(terminal, &mut tui_app, &session, &config)?;
                    session.poll_demo().await;
                    tui_app.busy = false;
                    tui_app.reset_selection();
                }
                Action::Select => {
                    let selected = tui_app.selected_row().cloned();
                    match selected {
                        Some(Row::CommentToggle(path)) => {
                            draw_busy(terminal, &mut tui_app, &session, &config)?;
                            session.toggle_comments(&path).await;
                            tui_app.busy = false;
                        }
                        Some(Row::LoadMoreComments(path)) => {
                            draw_busy(terminal, &mut tui_app, &session, &config)?;
                            session.load_more_comments(&path).await;
                            tui_app.busy = false;
                        }
                        _ => {}
                    }
                }
                Action::OpenInBrowser => {
                    if let Some(Row::Post(index)) = tui_app.selected_row().cloned() {
                        if let Some(SlotState::Loaded(view)) =
                            session.slots().get(index).map(|s| &s.state)
                        {
                            if let Some(url) = view.item.url() {
                                if let Err(e) = open::that(url) {
                                    tui_app.notify(format!("Failed to open browser: {}", e));
                                }
                            }
                        }
                    }
                }
                Action::None => {}
            },
            AppEvent::Tick => {
                if tui_app.should_load_more(&session) {
                    session.load_more().await;
                }
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Paint one frame with the loading indicator up before an awaited
/// fetch, so the indicator is visible while the loop is blocked on it.
fn draw_busy(
    terminal: &mut Tui,
    tui_app: &mut TuiApp,
    session: &FeedSession,
    config: &Config,
) -> Result<()> {
    tui_app.busy = true;
    tui_app.refresh_rows(session);
    terminal.draw(|frame| layout::render(frame, tui_app, session, &config.colors))?;
    Ok(())
}

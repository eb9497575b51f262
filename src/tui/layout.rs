use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::FeedKind;
use crate::session::{FeedSession, SlotState};
use crate::tui::app::{Row, TuiApp};

pub fn render(frame: &mut Frame, app: &mut TuiApp, session: &FeedSession, colors: &ColorConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(5),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_tab_bar(frame, app, session, chunks[0], colors);
    render_content(frame, app, session, chunks[1], colors);
    render_status_bar(frame, app, session, chunks[2], colors);

    if let Some(notification) = &app.notification {
        render_notification(frame, &notification.message, chunks[1], colors);
    }
}

fn render_tab_bar(
    frame: &mut Frame,
    app: &TuiApp,
    session: &FeedSession,
    area: Rect,
    colors: &ColorConfig,
) {
    let tab = |label: &str, active: bool| {
        let style = if active {
            Style::default()
                .fg(colors.active_tab)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.inactive_tab)
        };
        Span::styled(format!(" {} ", label), style)
    };

    let news_active = !app.poll_mode && session.current() == Some(FeedKind::NewStories);
    let jobs_active = !app.poll_mode && session.current() == Some(FeedKind::JobStories);

    let line = Line::from(vec![
        Span::styled(
            " kindling ",
            Style::default()
                .fg(colors.active_tab)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("|"),
        tab("[1] News", news_active),
        tab("[2] Jobs", jobs_active),
        tab("[3] Polls", app.poll_mode),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_content(
    frame: &mut Frame,
    app: &mut TuiApp,
    session: &FeedSession,
    area: Rect,
    colors: &ColorConfig,
) {
    let title = match (app.poll_mode, session.current()) {
        (true, _) => " Poll Demo ".to_string(),
        (false, Some(kind)) => format!(" {} ", kind.label()),
        (false, None) => " Posts ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border));

    if session.slots().is_empty() {
        let message = if let Some(placeholder) = session.placeholder() {
            placeholder.to_string()
        } else if session.is_loading() || app.busy {
            "Loading posts...".to_string()
        } else {
            "No posts".to_string()
        };
        let paragraph = Paragraph::new(message)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| row_item(row, session, colors))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(colors.selection_bg)
                .fg(colors.selection_fg),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn row_item<'a>(row: &Row, session: &'a FeedSession, colors: &ColorConfig) -> ListItem<'a> {
    match row {
        Row::Post(index) => {
            let slot = &session.slots()[*index];
            match &slot.state {
                SlotState::Pending => ListItem::new(Line::from(Span::styled(
                    format!("Loading post {}...", slot.id),
                    Style::default().fg(colors.loading),
                ))),
                SlotState::Failed => ListItem::new(Line::from(Span::styled(
                    format!("Failed to load post {}", slot.id),
                    Style::default().fg(colors.failed_item),
                ))),
                SlotState::Loaded(view) => {
                    if view.item.is_deleted() {
                        return ListItem::new(Line::from(Span::styled(
                            "[ UNAVAILABLE CONTENT ]",
                            Style::default().fg(colors.comment_text),
                        )));
                    }

                    let mut lines = vec![
                        Line::from(Span::styled(
                            view.item.display_title().to_string(),
                            Style::default()
                                .fg(colors.post_title)
                                .add_modifier(Modifier::BOLD),
                        )),
                        Line::from(vec![
                            Span::styled(
                                format!("By: {}", view.item.display_author()),
                                Style::default().fg(colors.metadata_author),
                            ),
                            Span::raw("  "),
                            Span::styled(
                                format!("At: {}", format_time(view.item.time)),
                                Style::default().fg(colors.metadata_date),
                            ),
                        ]),
                    ];
                    for text_line in view.item.display_text().lines() {
                        lines.push(Line::from(text_line.to_string()));
                    }
                    if let Some(url) = view.item.url() {
                        lines.push(Line::from(Span::styled(
                            format!("Read More: {}", url),
                            Style::default().fg(colors.metadata_link),
                        )));
                    }
                    lines.push(Line::from(""));
                    ListItem::new(Text::from(lines))
                }
            }
        }
        Row::PollOption { post, option } => {
            let text = match &session.slots()[*post].state {
                SlotState::Loaded(view) => {
                    let row = &view.poll_options[*option];
                    match &row.item {
                        Some(item) => Line::from(format!(
                            "➡️ {} ({})",
                            item.display_text(),
                            item.score()
                        )),
                        None => Line::from(Span::styled(
                            format!("Failed to load poll option {}", row.id),
                            Style::default().fg(colors.failed_item),
                        )),
                    }
                }
                _ => Line::from(""),
            };
            ListItem::new(text)
        }
        Row::CommentToggle(path) => {
            let expanded = session
                .thread_at(path)
                .map(|t| t.expanded)
                .unwrap_or(false);
            let label = if expanded {
                "[ Hide Comments ]"
            } else {
                "[ Comments ]"
            };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", indent(path.depth()), label),
                Style::default()
                    .fg(colors.metadata_link)
                    .add_modifier(Modifier::BOLD),
            )))
        }
        Row::Comment(path) => {
            let pad = indent(path.depth());
            let Some(node) = session.comment_at(path) else {
                return ListItem::new(Line::from(""));
            };
            match &node.item {
                None => ListItem::new(Line::from(Span::styled(
                    format!("{}Failed to load comment {}", pad, node.id),
                    Style::default().fg(colors.failed_item),
                ))),
                Some(item) if item.is_deleted() => ListItem::new(Line::from(Span::styled(
                    format!("{}[ DELETED ]", pad),
                    Style::default().fg(colors.comment_text),
                ))),
                Some(item) => {
                    let mut lines = vec![Line::from(Span::styled(
                        format!(
                            "{}By: {} ({})",
                            pad,
                            item.display_author(),
                            format_time(item.time)
                        ),
                        Style::default().fg(colors.metadata_author),
                    ))];
                    for text_line in item.display_text().lines() {
                        lines.push(Line::from(Span::styled(
                            format!("{}{}", pad, text_line),
                            Style::default().fg(colors.comment_text),
                        )));
                    }
                    ListItem::new(Text::from(lines))
                }
            }
        }
        Row::LoadMoreComments(path) => ListItem::new(Line::from(Span::styled(
            format!("{}[ Load More ]", indent(path.depth() + 1)),
            Style::default()
                .fg(colors.metadata_link)
                .add_modifier(Modifier::BOLD),
        ))),
    }
}

fn render_status_bar(
    frame: &mut Frame,
    app: &TuiApp,
    session: &FeedSession,
    area: Rect,
    colors: &ColorConfig,
) {
    let status = if session.is_loading() || app.busy {
        "Loading...".to_string()
    } else {
        "j/k:Nav  n/p:Page  1:News  2:Jobs  3:Polls  Enter:Comments  o:Open  q:Quit".to_string()
    };

    let style = if session.is_loading() || app.busy {
        Style::default().fg(colors.loading).bg(colors.status_bg)
    } else {
        Style::default().fg(colors.status_fg).bg(colors.status_bg)
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn render_notification(frame: &mut Frame, message: &str, area: Rect, colors: &ColorConfig) {
    let lines: Vec<&str> = message.lines().collect();
    let width = lines
        .iter()
        .map(|l| l.chars().count() as u16 + 4)
        .max()
        .unwrap_or(10)
        .min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);

    let popup = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    };

    let paragraph = Paragraph::new(message.to_string())
        .style(
            Style::default()
                .fg(colors.notification_fg)
                .bg(colors.notification_bg),
        )
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "unknown time".to_string(),
    }
}

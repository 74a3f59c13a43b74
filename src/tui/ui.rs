//! Rendering with ratatui.
//!
//! Layout: a header with the view title and scan totals, the row list of the
//! current view, and a footer with the status line and key hints. The
//! confirmation and help dialogs are drawn on top.

use bytesize::ByteSize;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
    Frame,
};

use super::app::{App, AppMode, PendingTrash};
use super::events::KEY_HELP;
use crate::actions::ItemKind;
use crate::progress::truncate_path;
use crate::session::{View, ViewItem};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 3;

/// List rows that fit in a terminal `height` rows tall.
#[must_use]
pub fn list_rows(height: u16) -> usize {
    usize::from(height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + 2)).max(1)
}

fn create_block<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .title(title)
}

/// Draw the whole screen.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);

    match app.mode() {
        AppMode::Confirming(pending) => render_confirm_dialog(frame, app, pending, area),
        AppMode::ShowingHelp => render_help_dialog(frame, app, area),
        AppMode::Browsing | AppMode::Quitting => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let index = session.index();
    let summary = session.summary();

    let mut spans = vec![
        Span::styled(
            "dirdupe",
            Style::default()
                .fg(app.theme().primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} files, {} duplicated, {}",
            index.total_files,
            index.total_duplicates,
            format_size(summary.total_size)
        )),
    ];
    if summary.has_skipped() {
        spans.push(Span::styled(
            format!(
                "  ({} files, {} dirs skipped)",
                summary.skipped_files, summary.skipped_dirs
            ),
            Style::default().fg(app.theme().secondary),
        ));
    }
    if !session.trash_stack().is_empty() {
        spans.push(Span::styled(
            format!("  [{} undoable]", session.trash_stack().len()),
            Style::default().fg(app.theme().dim),
        ));
    }

    let title = breadcrumb(session.view_stack().iter().map(|f| &f.view));
    let header = Paragraph::new(Line::from(spans)).block(
        create_block(truncate_path(&title, usize::from(area.width.saturating_sub(4))))
            .border_style(Style::default().fg(app.theme().primary)),
    );
    frame.render_widget(header, area);
}

/// Titles of the open views joined with `>`.
fn breadcrumb<'a>(views: impl Iterator<Item = &'a View>) -> String {
    views
        .map(|v| match v {
            View::Overview => "Overview".to_string(),
            View::DirDetail { dir } => dir
                .file_name()
                .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned()),
            View::FileMatches { file } => format!(
                "copies of {}",
                file.file_name()
                    .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned())
            ),
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let items = app.items();
    let selected = session.selected_index();
    let offset = session.scroll_offset();
    let rows = usize::from(area.height.saturating_sub(2));
    let width = usize::from(area.width.saturating_sub(4));
    let in_overview = matches!(session.current_view(), View::Overview);

    if items.is_empty() {
        let text = if in_overview {
            "No files found."
        } else {
            "Empty."
        };
        let message = Paragraph::new(text)
            .style(Style::default().fg(app.theme().success))
            .alignment(Alignment::Center)
            .block(create_block(session.current_view().title()));
        frame.render_widget(message, area);
        return;
    }

    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, item)| {
            let line = item_line(item, in_overview, width);
            let style = if i == selected {
                Style::default()
                    .fg(app.theme().inverted_fg)
                    .bg(app.theme().primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                item_style(app, item)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = format!(
        "{} ({}/{})",
        session.current_view().title(),
        selected + 1,
        items.len()
    );
    let list = List::new(list_items).block(
        create_block(truncate_path(&title, width)).border_style(Style::default().fg(app.theme().primary)),
    );

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    frame.render_widget(list, inner[0]);

    if items.len() > rows {
        let mut state = ScrollbarState::new(items.len().saturating_sub(rows)).position(offset);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼")),
            inner[1],
            &mut state,
        );
    }
}

/// Text of one row.
fn item_line(item: &ViewItem, full_paths: bool, width: usize) -> String {
    match item {
        ViewItem::Directory { path, stats } => {
            let name = if full_paths {
                path.display().to_string()
            } else {
                format!("{}/", file_name(path))
            };
            let prefix = format!(
                "{:>5.1}%  {:>9}  ",
                stats.redundancy_score * 100.0,
                format!("{}/{}", stats.duplicate_count, stats.file_count)
            );
            let room = width.saturating_sub(prefix.chars().count());
            format!("{}{}", prefix, truncate_path(&name, room))
        }
        ViewItem::File { path, redundancy } => {
            let copies = if *redundancy > 1 {
                format!("{} copies", redundancy)
            } else {
                "unique".to_string()
            };
            let prefix = format!("{:>17}  ", copies);
            let name = if full_paths {
                path.display().to_string()
            } else {
                file_name(path)
            };
            let room = width.saturating_sub(prefix.chars().count());
            format!("{}{}", prefix, truncate_path(&name, room))
        }
    }
}

fn item_style(app: &App, item: &ViewItem) -> Style {
    match item {
        ViewItem::Directory { stats, .. } => {
            Style::default().fg(app.theme().score_color(stats.redundancy_score))
        }
        ViewItem::File { redundancy, .. } if *redundancy > 1 => {
            Style::default().fg(app.theme().secondary)
        }
        ViewItem::File { .. } => Style::default().fg(app.theme().normal),
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.status() {
        Some(status) => {
            let color = if status.is_error {
                app.theme().danger
            } else {
                app.theme().success
            };
            Line::from(Span::styled(status.text.clone(), Style::default().fg(color)))
        }
        None => {
            let hints = [
                ("Enter", "open"),
                ("Esc", "back"),
                ("d", "trash"),
                ("u", "undo"),
                ("r", "rescan"),
                ("?", "help"),
                ("q", "quit"),
            ];
            let spans: Vec<Span> = hints
                .iter()
                .flat_map(|(key, desc)| {
                    [
                        Span::styled(
                            format!("[{}]", key),
                            Style::default()
                                .fg(app.theme().secondary)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!("{} ", desc), Style::default().fg(app.theme().normal)),
                    ]
                })
                .collect();
            Line::from(spans)
        }
    };

    let footer = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(create_block("").border_style(Style::default().fg(app.theme().dim)));
    frame.render_widget(footer, area);
}

fn render_confirm_dialog(frame: &mut Frame, app: &App, pending: &PendingTrash, area: Rect) {
    let dialog_area = centered_rect(60, 40, area);
    frame.render_widget(Clear, dialog_area);

    let warning = match pending.kind {
        ItemKind::Directory => "This moves the whole directory to the holding area.".to_string(),
        ItemKind::File => "This is the only copy of its content.".to_string(),
    };
    let path = pending.path.display().to_string();

    let lines = vec![
        Line::from(Span::styled(
            format!("Trash {}?", pending.kind),
            Style::default()
                .fg(app.theme().danger)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(truncate_path(&path, usize::from(dialog_area.width.saturating_sub(4)))),
        Line::from(""),
        Line::from(Span::styled(warning, Style::default().fg(app.theme().secondary))),
        Line::from("It can be restored with u."),
        Line::from(""),
        Line::from(Span::styled(
            "[y] Trash    [n] Cancel",
            Style::default().fg(app.theme().primary),
        )),
    ];

    let dialog = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(create_block("Confirm").border_style(Style::default().fg(app.theme().danger)));
    frame.render_widget(dialog, dialog_area);
}

fn render_help_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let dialog_area = centered_rect(50, 60, area);
    frame.render_widget(Clear, dialog_area);

    let lines: Vec<Line> = KEY_HELP
        .iter()
        .map(|(keys, desc)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<14}", keys),
                    Style::default()
                        .fg(app.theme().secondary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(desc.to_string(), Style::default().fg(app.theme().normal)),
            ])
        })
        .collect();

    let help = Paragraph::new(Text::from(lines))
        .block(create_block("Keys").border_style(Style::default().fg(app.theme().primary)));
    frame.render_widget(help, dialog_area);
}

/// Human-readable byte count.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

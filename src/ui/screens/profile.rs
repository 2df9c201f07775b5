use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::sync::Mode;
use crate::ui::app::{App, AppTracker};
use crate::ui::theme::Palette;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, tracker: &AppTracker, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_account(f, chunks[0], app, tracker, p);
    render_issues(f, chunks[1], tracker, p);
}

fn field<'a>(label: &'a str, value: String, p: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {label:<14}"), p.dim_style()),
        Span::styled(value, p.normal_style().add_modifier(Modifier::BOLD)),
    ])
}

fn render_account(f: &mut Frame, area: Rect, app: &App, tracker: &AppTracker, p: &Palette) {
    let (mode, user) = match tracker.mode() {
        Mode::Local => ("Local (this device)".to_string(), "Guest".to_string()),
        Mode::Cloud(session) => ("Cloud".to_string(), session.email.clone()),
    };

    let mut lines = vec![
        Line::from(""),
        field("Mode", mode, p),
        field("Account", user, p),
        field("Username", tracker.username().unwrap_or("Guest").to_string(), p),
        field("Theme", tracker.theme().to_string(), p),
        field("Budget", format_amount(tracker.budget_limit()), p),
        field("Transactions", tracker.transactions().len().to_string(), p),
        field("Balance", format_amount(app.balance.balance), p),
        Line::from(""),
    ];

    let hints: &[&str] = if tracker.is_cloud() {
        &[":passwd   change password", ":logout   back to local data", ":sync     reload from cloud"]
    } else {
        &[":login <username>    sign in", ":signup <username>   create an account"]
    };
    lines.extend(
        hints
            .iter()
            .map(|h| Line::from(Span::styled(format!("  {h}"), p.dim_style()))),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(p.border_style())
        .title(Span::styled(
            " Profile ",
            p.dim_style().add_modifier(Modifier::BOLD),
        ));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_issues(f: &mut Frame, area: Rect, tracker: &AppTracker, p: &Palette) {
    let issues = tracker.issues();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if issues.is_empty() {
            p.border_style()
        } else {
            Style::default().fg(p.yellow)
        })
        .title(Span::styled(
            format!(" Sync Issues ({}) ", issues.len()),
            p.dim_style().add_modifier(Modifier::BOLD),
        ));

    if issues.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("Everything is in sync", p.dim_style())),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let mut items: Vec<ListItem> = issues
        .iter()
        .rev()
        .map(|issue| ListItem::new(truncate(&issue.to_string(), width)).style(p.warning_style()))
        .collect();
    items.push(ListItem::new(""));
    items.push(ListItem::new(Span::styled(
        "Run :sync to reload the cloud copy",
        p.dim_style(),
    )));

    f.render_widget(List::new(items).block(block), area);
}

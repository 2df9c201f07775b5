use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{App, AppTracker, InputMode, Screen};
use super::commands;
use super::theme::{palette, Palette};

pub(crate) fn render(f: &mut Frame, app: &App, tracker: &AppTracker) {
    let p = palette(tracker.theme());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Command bar
        ])
        .split(f.area());

    f.render_widget(Block::default().style(p.normal_style()), f.area());
    render_tab_bar(f, chunks[0], app, p);
    render_screen(f, chunks[1], app, tracker, p);
    render_status_bar(f, chunks[2], app, tracker, p);
    render_command_bar(f, chunks[3], app, p);

    if app.show_help {
        render_help_overlay(f, f.area(), p);
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let num = format!("{}", i + 1);
            if *s == app.screen {
                Line::from(vec![
                    Span::styled(format!("{num}:"), p.dim_style()),
                    Span::styled(
                        format!("{s}"),
                        Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(Span::styled(format!("{num}:{s}"), p.dim_style()))
            }
        })
        .collect();

    let tabs = Tabs::new(titles)
        .divider(Span::styled(" | ", p.border_style()))
        .style(Style::default().bg(p.header_bg));

    f.render_widget(tabs, area);
}

fn render_screen(f: &mut Frame, area: Rect, app: &App, tracker: &AppTracker, p: &Palette) {
    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, area, app, p),
        Screen::Transactions => super::screens::transactions::render(f, area, app, tracker, p),
        Screen::Profile => super::screens::profile::render(f, area, app, tracker, p),
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, tracker: &AppTracker, p: &Palette) {
    let mode_label = format!(" {} ", app.input_mode);
    let mode_bg = match app.input_mode {
        InputMode::Normal => p.accent,
        InputMode::Command => p.green,
        InputMode::Search => p.yellow,
        InputMode::Confirm | InputMode::Secret => p.red,
    };
    let mode_style = Style::default()
        .fg(p.header_bg)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD);

    let who = match tracker.username() {
        Some(user) => format!("cloud:{user}"),
        None => "local".to_string(),
    };
    let mut info = format!(
        " {} | {} | {} txns",
        app.screen,
        who,
        tracker.transactions().len()
    );
    if !tracker.issues().is_empty() {
        info.push_str(&format!(" | {} unsynced", tracker.issues().len()));
    }

    let right = match app.screen {
        Screen::Dashboard => " :add | :budget | ? help ",
        Screen::Transactions => " D delete | e edit | / search | f type | o sort ",
        Screen::Profile => " :login | :signup | :logout | T theme ",
    };

    let available = area.width as usize;
    let used = mode_label.len() + info.chars().count() + right.len();
    let pad = available.saturating_sub(used);

    let info_style = if tracker.issues().is_empty() {
        p.status_bar_style()
    } else {
        p.status_bar_style().fg(p.yellow)
    };

    let bar = Paragraph::new(Line::from(vec![
        Span::styled(&mode_label, mode_style),
        Span::styled(&info, info_style),
        Span::styled(" ".repeat(pad), p.status_bar_style()),
        Span::styled(right, p.status_bar_style()),
    ]));
    f.render_widget(bar, area);
}

fn render_command_bar(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let (content, cursor_offset) = match app.input_mode {
        InputMode::Command => (
            Line::from(vec![
                Span::styled(":", Style::default().fg(p.accent)),
                Span::styled(&app.command_input, p.command_bar_style()),
            ]),
            Some(1 + app.command_input.chars().count() as u16),
        ),
        InputMode::Search => {
            let match_info = if !app.query.search.is_empty() {
                format!("  ({} matches)", app.visible.len())
            } else {
                String::new()
            };
            (
                Line::from(vec![
                    Span::styled("/", Style::default().fg(p.yellow)),
                    Span::styled(&app.query.search, p.command_bar_style()),
                    Span::styled(match_info, p.dim_style()),
                ]),
                Some(1 + app.query.search.chars().count() as u16),
            )
        }
        InputMode::Secret => {
            let label = app
                .secret_prompt
                .as_ref()
                .map_or("Password", |prompt| prompt.label());
            let prefix = format!("{label}: ");
            let offset = prefix.len() + app.secret_input.chars().count();
            (
                Line::from(vec![
                    Span::styled(prefix, Style::default().fg(p.red)),
                    Span::styled(
                        "*".repeat(app.secret_input.chars().count()),
                        p.command_bar_style(),
                    ),
                ]),
                Some(offset as u16),
            )
        }
        InputMode::Confirm => (
            Line::from(vec![
                Span::styled(&app.confirm_message, Style::default().fg(p.yellow)),
                Span::styled(" [y/N] ", Style::default().fg(p.red)),
            ]),
            None,
        ),
        InputMode::Normal => (
            if app.status_message.is_empty() {
                Line::from(Span::styled(
                    " Press : for commands, / to search, ? for help",
                    p.dim_style(),
                ))
            } else {
                Line::from(Span::styled(&app.status_message, p.command_bar_style()))
            },
            None,
        ),
    };

    let bar = Paragraph::new(content).style(Style::default().bg(p.command_bg));
    f.render_widget(bar, area);

    if let Some(offset) = cursor_offset {
        f.set_cursor_position((area.x + offset, area.y));
    }
}

fn render_help_overlay(f: &mut Frame, area: Rect, p: &Palette) {
    let heading = Style::default().fg(p.yellow).add_modifier(Modifier::BOLD);
    let mut help_text = vec![
        Line::from(Span::styled(
            " FinancePro Help ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", heading)),
        Line::from(Span::styled(
            "  j/k or Up/Down   Move cursor           1-3        Switch tabs",
            p.normal_style(),
        )),
        Line::from(Span::styled(
            "  Tab/Shift-Tab    Cycle tabs            g/G        Top/Bottom",
            p.normal_style(),
        )),
        Line::from(Span::styled(
            "  Ctrl-d/u         Page Down/Up          Ctrl-q     Quit",
            p.normal_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Actions", heading)),
        Line::from(Span::styled(
            "  :               Command mode           /          Search (live)",
            p.normal_style(),
        )),
        Line::from(Span::styled(
            "  D (Transactions) Delete transaction    e          Edit selected",
            p.normal_style(),
        )),
        Line::from(Span::styled(
            "  f               Cycle type filter      o          Cycle order",
            p.normal_style(),
        )),
        Line::from(Span::styled(
            "  T               Toggle theme           Esc        Cancel/Back",
            p.normal_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Commands", heading)),
    ];

    // Build command list dynamically from COMMANDS registry
    let mut seen = std::collections::HashSet::new();
    let mut cmd_lines: Vec<(&str, &str)> = Vec::new();
    for (&name, cmd) in commands::COMMANDS.iter() {
        if name.len() <= 2 {
            continue;
        }
        if seen.insert(cmd.description) {
            cmd_lines.push((name, cmd.description));
        }
    }
    cmd_lines.sort_by_key(|(name, _)| *name);
    for (name, desc) in &cmd_lines {
        help_text.push(Line::from(Span::styled(
            format!("  :{name:<14} {desc}"),
            p.normal_style(),
        )));
    }

    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(
        " Press any key to close ",
        p.dim_style(),
    )));

    // Center the popup, clamped to terminal height
    let popup_height = (help_text.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_width = 76.min(area.width.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(x, y, popup_width, popup_height);

    f.render_widget(Clear, popup_area);
    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(p.accent))
            .style(Style::default().bg(p.header_bg)),
    );
    f.render_widget(help, popup_area);
}

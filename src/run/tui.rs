use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::ui::app::{App, AppTracker, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(tracker: &mut AppTracker) -> Result<()> {
    let mut app = App::new();
    app.sync(tracker);
    if !tracker.issues().is_empty() {
        app.set_status("Could not reach the cloud copy. Showing what was loaded; run :sync");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, tracker);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "tui exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tracker: &mut AppTracker,
) -> Result<()> {
    while app.running {
        app.sync(tracker);
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(7) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app, tracker);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, tracker)?,
                InputMode::Command => handle_command_input(key, app, tracker)?,
                InputMode::Search => handle_search_input(key, app),
                InputMode::Confirm => handle_confirm_input(key, app, tracker),
                InputMode::Secret => handle_secret_input(key, app, tracker),
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(
    key: event::KeyEvent,
    app: &mut App,
    tracker: &mut AppTracker,
) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.screen = Screen::Transactions;
            app.update_query(|q| q.search.clear());
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('1') => app.screen = Screen::Dashboard,
        KeyCode::Char('2') => app.screen = Screen::Transactions,
        KeyCode::Char('3') => app.screen = Screen::Profile,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            app.screen = screens[(idx + 1) % screens.len()];
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            app.screen = screens[prev];
        }
        KeyCode::Esc => handle_escape(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('T') => commands::handle_command("theme", app, tracker)?,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_up(app);
            }
        }
        KeyCode::Char('D') if app.screen == Screen::Transactions => {
            commands::handle_command("delete", app, tracker)?;
        }
        KeyCode::Char('e') | KeyCode::Enter if app.screen == Screen::Transactions => {
            commands::handle_command("edit", app, tracker)?;
        }
        KeyCode::Char('a') => {
            app.command_input = "add ".to_string();
            app.input_mode = InputMode::Command;
        }
        KeyCode::Char('f') if app.screen == Screen::Transactions => {
            commands::handle_command("type", app, tracker)?;
        }
        KeyCode::Char('o') if app.screen == Screen::Transactions => {
            commands::handle_command("sort", app, tracker)?;
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(
    key: event::KeyEvent,
    app: &mut App,
    tracker: &mut AppTracker,
) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, tracker)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Every keystroke narrows the list immediately.
fn handle_search_input(key: event::KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.update_query(|q| q.search.clear());
        }
        KeyCode::Backspace => {
            app.update_query(|q| {
                q.search.pop();
            });
        }
        KeyCode::Char(c) => {
            app.update_query(|q| q.search.push(c));
        }
        _ => {}
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, tracker: &mut AppTracker) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => commands::resolve_pending(app, tracker, true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            commands::resolve_pending(app, tracker, false)
        }
        _ => {}
    }
}

fn handle_secret_input(key: event::KeyEvent, app: &mut App, tracker: &mut AppTracker) {
    match key.code {
        KeyCode::Enter => commands::submit_secret(app, tracker),
        KeyCode::Esc => {
            app.cancel_secret();
            app.set_status("Cancelled");
        }
        KeyCode::Backspace => {
            app.secret_input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.secret_input.clear();
        }
        KeyCode::Char(c) => {
            app.secret_input.push(c);
        }
        _ => {}
    }
}

// ── Navigation helpers ───────────────────────────────────────

fn handle_move_down(app: &mut App) {
    if app.screen == Screen::Transactions {
        let len = app.visible.len();
        scroll_down(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            len,
            app.visible_rows,
        );
    }
}

fn handle_move_up(app: &mut App) {
    if app.screen == Screen::Transactions {
        scroll_up(&mut app.transaction_index, &mut app.transaction_scroll);
    }
}

fn handle_goto_top(app: &mut App) {
    if app.screen == Screen::Transactions {
        scroll_to_top(&mut app.transaction_index, &mut app.transaction_scroll);
    }
}

fn handle_goto_bottom(app: &mut App) {
    if app.screen == Screen::Transactions {
        let len = app.visible.len();
        scroll_to_bottom(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            len,
            app.visible_rows,
        );
    }
}

fn handle_escape(app: &mut App) {
    if !app.query.search.is_empty() {
        app.update_query(|q| q.search.clear());
        app.set_status("Search cleared");
    } else {
        app.status_message.clear();
    }
}

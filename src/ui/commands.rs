use std::collections::HashMap;
use std::sync::LazyLock;

use super::app::{App, AppTracker, InputMode, PendingAction, SecretPrompt, Screen};
use crate::export;
use crate::filter::{KindFilter, SortOrder, TransactionQuery};
use crate::models::{parse_amount, Kind, Theme, TransactionForm, DATE_FORMAT};
use crate::ui::util::format_amount;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut AppTracker) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit FinancePro", cmd_quit, r);
    register_command!("quit", "Quit FinancePro", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("p", "Go to Profile", cmd_profile, r);
    register_command!("profile", "Go to Profile", cmd_profile, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "search",
        "Search titles (e.g. :search coffee)",
        cmd_search,
        r
    );
    register_command!("s", "Search titles (e.g. :s coffee)", cmd_search, r);
    register_command!(
        "type",
        "Filter by type: all, income, expense",
        cmd_type,
        r
    );
    register_command!(
        "sort",
        "Order by: newest, oldest, highest",
        cmd_sort,
        r
    );
    register_command!("clear", "Reset search, type and order", cmd_clear, r);
    register_command!(
        "add",
        "Add (e.g. :add expense Food 12.50 Lunch)",
        cmd_add,
        r
    );
    register_command!(
        "a",
        "Add (e.g. :a 2024-01-15 income Salary 3000 Paycheck)",
        cmd_add,
        r
    );
    register_command!(
        "edit",
        "Edit selected transaction (no args pre-fills it)",
        cmd_edit,
        r
    );
    register_command!("e", "Edit selected transaction", cmd_edit, r);
    register_command!("delete", "Delete selected transaction", cmd_delete, r);
    register_command!("del", "Delete selected transaction", cmd_delete, r);
    register_command!(
        "export",
        "Export all transactions to CSV (e.g. :export ~/report.csv)",
        cmd_export,
        r
    );
    register_command!(
        "budget",
        "Set the budget limit (e.g. :budget 2500)",
        cmd_budget,
        r
    );
    register_command!("theme", "Switch theme: light, dark", cmd_theme, r);
    register_command!("login", "Sign in (e.g. :login alice1)", cmd_login, r);
    register_command!(
        "signup",
        "Create an account (e.g. :signup alice1)",
        cmd_signup,
        r
    );
    register_command!("logout", "Sign out and return to local data", cmd_logout, r);
    register_command!("passwd", "Change password", cmd_passwd, r);
    register_command!(
        "sync",
        "Reload transactions from their source",
        cmd_sync,
        r
    );

    r
});

pub(crate) fn handle_command(
    input: &str,
    app: &mut App,
    tracker: &mut AppTracker,
) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if cmd_name.is_empty() {
        return Ok(());
    }

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, tracker)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Act on the answer to a confirmation prompt.
pub(crate) fn resolve_pending(app: &mut App, tracker: &mut AppTracker, confirmed: bool) {
    let action = app.pending_action.take();
    app.confirm_message.clear();
    app.input_mode = InputMode::Normal;

    let Some(action) = action else {
        return;
    };
    if !confirmed {
        app.set_status("Cancelled");
        return;
    }

    match action {
        PendingAction::DeleteTransaction { id, title } => match tracker.delete(&id) {
            Ok(_) => app.set_status(format!("Deleted: {title}")),
            Err(e) => app.set_status(e.to_string()),
        },
        PendingAction::SignOut => {
            tracker.sign_out();
            app.set_status("Signed out. Showing local data");
        }
    }
}

/// Submit the masked input for the current prompt, advancing multi-step
/// prompts or calling the tracker once everything is collected.
pub(crate) fn submit_secret(app: &mut App, tracker: &mut AppTracker) {
    let secret = std::mem::take(&mut app.secret_input);
    let Some(prompt) = app.secret_prompt.take() else {
        app.input_mode = InputMode::Normal;
        return;
    };

    match prompt {
        SecretPrompt::SignIn { username } => {
            app.input_mode = InputMode::Normal;
            match tracker.sign_in(&username, &secret) {
                Ok(()) => app.set_status(signed_in_status(tracker)),
                Err(e) => app.set_status(e.to_string()),
            }
        }
        SecretPrompt::SignUp { username } => {
            app.input_mode = InputMode::Normal;
            match tracker.sign_up(&username, &secret) {
                Ok(()) => app.set_status(signed_in_status(tracker)),
                Err(e) => app.set_status(e.to_string()),
            }
        }
        SecretPrompt::CurrentPassword => {
            app.start_secret(SecretPrompt::NewPassword { current: secret });
        }
        SecretPrompt::NewPassword { current } => {
            app.start_secret(SecretPrompt::ConfirmPassword {
                current,
                new: secret,
            });
        }
        SecretPrompt::ConfirmPassword { current, new } => {
            app.input_mode = InputMode::Normal;
            match tracker.change_password(&current, &new, &secret) {
                Ok(()) => app.set_status("Password updated"),
                Err(e) => app.set_status(e.to_string()),
            }
        }
    }
}

fn signed_in_status(tracker: &AppTracker) -> String {
    let user = tracker.username().unwrap_or("User");
    match tracker.issues().last() {
        Some(issue) => format!("Signed in as {user}, but sync failed: {issue}"),
        None => format!(
            "Signed in as {user}. {} cloud transactions",
            tracker.transactions().len()
        ),
    }
}

/// Report the newest sync issue raised by the last change, if any.
fn report_sync(app: &mut App, tracker: &AppTracker, issues_before: usize, ok: String) {
    match tracker.issues().get(issues_before..).and_then(|new| new.last()) {
        Some(issue) => app.set_status(format!("Saved here, not in the cloud ({issue}). Run :sync")),
        None => app.set_status(ok),
    }
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    Ok(())
}

fn cmd_transactions(
    _args: &str,
    app: &mut App,
    _tracker: &mut AppTracker,
) -> anyhow::Result<()> {
    app.screen = Screen::Transactions;
    Ok(())
}

fn cmd_profile(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.screen = Screen::Profile;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_search(args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.update_query(|q| q.search = args.to_string());
    app.screen = Screen::Transactions;
    if args.is_empty() {
        app.set_status("Search cleared");
    } else {
        app.set_status(format!("Searching: {args}"));
    }
    Ok(())
}

fn cmd_type(args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    let kind = if args.is_empty() {
        app.query.kind.next()
    } else {
        match KindFilter::parse(args) {
            Some(kind) => kind,
            None => {
                app.set_status(format!("Unknown type: {args}. Use all, income or expense"));
                return Ok(());
            }
        }
    };
    app.update_query(|q| q.kind = kind);
    app.screen = Screen::Transactions;
    app.set_status(format!("Showing: {kind}"));
    Ok(())
}

fn cmd_sort(args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    let order = if args.is_empty() {
        app.query.order.next()
    } else {
        match SortOrder::parse(args) {
            Some(order) => order,
            None => {
                app.set_status(format!("Unknown order: {args}. Use newest, oldest or highest"));
                return Ok(());
            }
        }
    };
    app.update_query(|q| q.order = order);
    app.screen = Screen::Transactions;
    app.set_status(format!("Sorted by: {order}"));
    Ok(())
}

fn cmd_clear(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    app.update_query(|q| *q = TransactionQuery::default());
    app.set_status("Filters cleared");
    Ok(())
}

fn cmd_add(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(
            "Usage: :add [YYYY-MM-DD] <income|expense> <category> <amount> <title>",
        );
        return Ok(());
    }
    let words: Vec<&str> = args.split_whitespace().collect();
    let txn = match TransactionForm::from_words(&words).and_then(|f| f.parse(None, app.today)) {
        Ok(txn) => txn,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };

    let ok = format!(
        "Added {} {}: {}",
        txn.kind(),
        format_amount(txn.amount),
        txn.title
    );
    let before = tracker.issues().len();
    tracker.create(txn);
    app.transaction_index = 0;
    app.transaction_scroll = 0;
    report_sync(app, tracker, before, ok);
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    let Some(selected) = app.selected_transaction().cloned() else {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    };

    // `:edit` alone or `:edit <type>` opens the record in the command bar.
    let retype = Kind::parse(args);
    if args.is_empty() || retype.is_some() {
        let mut form = TransactionForm::from_transaction(&selected);
        if let Some(kind) = retype {
            form.set_kind(kind);
        }
        app.command_input = format!(
            "edit {} {} {} {} {}",
            form.date, form.kind, form.category, form.amount, form.title
        );
        app.input_mode = InputMode::Command;
        app.set_status("Change the fields, press Enter to save");
        return Ok(());
    }

    let words: Vec<&str> = args.split_whitespace().collect();
    let txn = match TransactionForm::from_words(&words)
        .and_then(|f| f.parse(Some(selected.id.as_str()), app.today))
    {
        Ok(txn) => txn,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };

    let ok = format!("Updated: {}", txn.title);
    let before = tracker.issues().len();
    match tracker.update(txn) {
        Ok(()) => report_sync(app, tracker, before, ok),
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _tracker: &mut AppTracker) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    let Some(txn) = app.selected_transaction().cloned() else {
        app.set_status("No transaction selected");
        return Ok(());
    };
    app.confirm_message = format!(
        "Delete '{}' ({}, {})?",
        txn.title,
        format_amount(txn.amount),
        txn.date.format(DATE_FORMAT)
    );
    app.pending_action = Some(PendingAction::DeleteTransaction {
        id: txn.id,
        title: txn.title,
    });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        export::default_export_path()
    } else {
        export::expand_path(args)
    };
    match export::export_to_path(tracker.transactions(), &path) {
        Ok(count) => app.set_status(format!(
            "Exported {count} transactions to {}",
            path.display()
        )),
        Err(e) => app.set_status(format!("Export failed: {e:#}")),
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(format!(
            "Budget limit: {}. Usage: :budget <amount>",
            format_amount(tracker.budget_limit())
        ));
        return Ok(());
    }
    match parse_amount(args) {
        Ok(limit) => {
            tracker.set_budget(limit);
            app.set_status(format!("Budget limit set to {}", format_amount(limit)));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_theme(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    let theme = if args.is_empty() {
        tracker.toggle_theme()
    } else {
        match Theme::parse(args) {
            Some(theme) => {
                tracker.set_theme(theme);
                theme
            }
            None => {
                app.set_status(format!("Unknown theme: {args}. Use light or dark"));
                return Ok(());
            }
        }
    };
    app.set_status(format!("Theme: {theme}"));
    Ok(())
}

fn cmd_login(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if tracker.is_cloud() {
        app.set_status("Already signed in. Use :logout first");
        return Ok(());
    }
    if args.is_empty() {
        app.set_status("Usage: :login <username>");
        return Ok(());
    }
    app.start_secret(SecretPrompt::SignIn {
        username: args.to_string(),
    });
    Ok(())
}

fn cmd_signup(args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if tracker.is_cloud() {
        app.set_status("Already signed in. Use :logout first");
        return Ok(());
    }
    if args.is_empty() {
        app.set_status("Usage: :signup <username>");
        return Ok(());
    }
    app.start_secret(SecretPrompt::SignUp {
        username: args.to_string(),
    });
    Ok(())
}

fn cmd_logout(_args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if !tracker.is_cloud() {
        app.set_status("Not signed in");
        return Ok(());
    }
    app.confirm_message = "Sign out? Cloud changes stay in the cloud.".into();
    app.pending_action = Some(PendingAction::SignOut);
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_passwd(_args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    if !tracker.is_cloud() {
        app.set_status("Sign in to change your password");
        return Ok(());
    }
    app.start_secret(SecretPrompt::CurrentPassword);
    Ok(())
}

fn cmd_sync(_args: &str, app: &mut App, tracker: &mut AppTracker) -> anyhow::Result<()> {
    tracker.resync();
    match tracker.issues().last() {
        Some(issue) => app.set_status(format!("Sync failed: {issue}")),
        None => app.set_status(format!(
            "Reloaded {} transactions",
            tracker.transactions().len()
        )),
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

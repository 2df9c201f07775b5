use anyhow::{Context, Result};
use chrono::Local;

use crate::aggregate::{
    budget_progress, calculate_balance, category_breakdown, monthly_trend, TREND_WINDOW,
};
use crate::export;
use crate::filter::{KindFilter, SortOrder, TransactionQuery};
use crate::models::{parse_amount, Kind, Theme, Transaction, TransactionForm, DATE_FORMAT};
use crate::ui::app::AppTracker;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn as_cli(args: &[String], tracker: &mut AppTracker) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "summary" | "s" => cli_summary(tracker),
        "list" | "ls" => cli_list(rest, tracker),
        "add" => cli_add(rest, tracker),
        "delete" | "rm" => cli_delete(rest, tracker),
        "export" => cli_export(rest, tracker),
        "budget" => cli_budget(rest, tracker),
        "theme" => cli_theme(rest, tracker),
        "login" => cli_login(rest, tracker, false),
        "signup" => cli_login(rest, tracker, true),
        "logout" => cli_logout(tracker),
        "whoami" => cli_whoami(tracker),
        "passwd" => cli_passwd(tracker),
        "sync" => cli_sync(tracker),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("financepro {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("FinancePro: personal income and expense tracker");
    println!();
    println!("Usage: financepro [command]");
    println!();
    println!("Commands:");
    println!("  (none)                        Launch interactive TUI");
    println!("  summary                       Balance, budget and category totals");
    println!("  list                          List transactions");
    println!("    --search <text>             Only titles containing text");
    println!("    --type <all|income|expense> Only one type");
    println!("    --sort <newest|oldest|highest>");
    println!("  add <type> <category> <amount> <title...>");
    println!("    --date <YYYY-MM-DD>         Date (default: today)");
    println!("  delete <id>                   Delete by id or unique id prefix");
    println!("  export [path]                 Export all transactions to CSV");
    println!("  budget [amount]               Show or set the budget limit");
    println!("  theme [light|dark|toggle]     Show or set the TUI theme");
    println!("  login <username>              Sign in and use cloud data");
    println!("  signup <username>             Create an account and sign in");
    println!("  logout                        Sign out and return to local data");
    println!("  whoami                        Show the current mode and user");
    println!("  passwd                        Change password");
    println!("  sync                          Reload transactions from their source");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

/// Value following `--name`, if present.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither `--flags` nor their values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

/// Resolve a full id or an unambiguous prefix of one.
fn find_by_prefix<'a>(txns: &'a [Transaction], prefix: &str) -> Result<&'a Transaction> {
    if let Some(exact) = txns.iter().find(|t| t.id == prefix) {
        return Ok(exact);
    }
    let matches: Vec<&Transaction> = txns.iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [one] => Ok(*one),
        [] => anyhow::bail!("No transaction with id '{prefix}'"),
        many => anyhow::bail!(
            "'{prefix}' matches {} transactions. Use more characters",
            many.len()
        ),
    }
}

fn warn_new_issues(tracker: &AppTracker, before: usize) {
    for issue in tracker.issues().iter().skip(before) {
        eprintln!("Warning: saved locally in memory only, cloud update failed: {issue}");
    }
}

fn cli_summary(tracker: &AppTracker) -> Result<()> {
    let txns = tracker.transactions();
    let balance = calculate_balance(txns);
    let budget = budget_progress(&balance, tracker.budget_limit());
    let source = match tracker.username() {
        Some(user) => format!("cloud ({user})"),
        None => "local".to_string(),
    };

    println!("FinancePro: {source}");
    println!("{}", "─".repeat(40));
    println!("  Income:     {}", format_amount(balance.income));
    println!("  Expenses:   {}", format_amount(balance.expense));
    println!("  Balance:    {}", format_amount(balance.balance));
    println!("  Total Txns: {}", txns.len());
    println!();
    println!(
        "Budget: {} of {} ({}%), {} left",
        format_amount(budget.spent),
        format_amount(budget.limit),
        budget.percent.round_dp(1),
        format_amount(budget.remaining)
    );

    for kind in [Kind::Expense, Kind::Income] {
        let totals = category_breakdown(txns, kind);
        if totals.is_empty() {
            continue;
        }
        println!();
        println!("{} by Category:", if kind == Kind::Expense { "Expenses" } else { "Income" });
        for total in &totals {
            println!("  {:<24} {}", total.name(), format_amount(total.total));
        }
    }

    println!();
    println!("Last {TREND_WINDOW} months:");
    for bucket in monthly_trend(txns, Local::now().date_naive(), TREND_WINDOW) {
        println!(
            "  {} {}  in {:>14}  out {:>14}",
            bucket.label,
            bucket.year,
            format_amount(bucket.income),
            format_amount(bucket.expense)
        );
    }

    for issue in tracker.issues() {
        eprintln!("Warning: {issue}");
    }
    Ok(())
}

fn cli_list(args: &[String], tracker: &AppTracker) -> Result<()> {
    let mut query = TransactionQuery::default();
    if let Some(search) = flag_value(args, "--search") {
        query.search = search.to_string();
    }
    if let Some(kind) = flag_value(args, "--type") {
        query.kind = KindFilter::parse(kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown type '{kind}'. Use all, income or expense"))?;
    }
    if let Some(order) = flag_value(args, "--sort") {
        query.order = SortOrder::parse(order).ok_or_else(|| {
            anyhow::anyhow!("Unknown order '{order}'. Use newest, oldest or highest")
        })?;
    }

    let txns = query.apply(tracker.transactions());
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<10} {:<12} {:<30} {:<14} {:<8} {:>14}",
        "ID", "Date", "Title", "Category", "Type", "Amount"
    );
    println!("{}", "─".repeat(93));
    for txn in &txns {
        println!(
            "{:<10} {:<12} {:<30} {:<14} {:<8} {:>14}",
            txn.id.chars().take(8).collect::<String>(),
            txn.date.format(DATE_FORMAT).to_string(),
            truncate(&txn.title, 30),
            txn.entry.category_name(),
            txn.kind().as_str(),
            format_amount(txn.amount),
        );
    }
    println!("{} of {} transactions", txns.len(), tracker.transactions().len());
    Ok(())
}

fn cli_add(args: &[String], tracker: &mut AppTracker) -> Result<()> {
    let mut words = positional(args);
    if let Some(date) = flag_value(args, "--date") {
        words.insert(0, date);
    }
    let txn = TransactionForm::from_words(&words)?.parse(None, Local::now().date_naive())?;
    let summary = format!(
        "Added {} {} {}: {} ({})",
        txn.kind(),
        txn.entry.category_name(),
        format_amount(txn.amount),
        txn.title,
        txn.id
    );

    let before = tracker.issues().len();
    tracker.create(txn);
    println!("{summary}");
    warn_new_issues(tracker, before);
    Ok(())
}

fn cli_delete(args: &[String], tracker: &mut AppTracker) -> Result<()> {
    let Some(prefix) = args.first() else {
        anyhow::bail!("Usage: financepro delete <id>");
    };
    let id = find_by_prefix(tracker.transactions(), prefix)?.id.clone();

    let before = tracker.issues().len();
    let removed = tracker.delete(&id)?;
    println!(
        "Deleted {} ({}, {})",
        removed.title,
        format_amount(removed.amount),
        removed.date.format(DATE_FORMAT)
    );
    warn_new_issues(tracker, before);
    Ok(())
}

fn cli_export(args: &[String], tracker: &AppTracker) -> Result<()> {
    let path = args
        .first()
        .map(|a| export::expand_path(a))
        .unwrap_or_else(export::default_export_path);
    let count = export::export_to_path(tracker.transactions(), &path)?;
    println!("Exported {count} transactions to {}", path.display());
    Ok(())
}

fn cli_budget(args: &[String], tracker: &mut AppTracker) -> Result<()> {
    match args.first() {
        None => println!("Budget limit: {}", format_amount(tracker.budget_limit())),
        Some(raw) => {
            let limit = parse_amount(raw)?;
            tracker.set_budget(limit);
            println!("Budget limit set to {}", format_amount(limit));
        }
    }
    Ok(())
}

fn cli_theme(args: &[String], tracker: &mut AppTracker) -> Result<()> {
    match args.first().map(String::as_str) {
        None => println!("Theme: {}", tracker.theme()),
        Some("toggle") => println!("Theme: {}", tracker.toggle_theme()),
        Some(raw) => {
            let theme = Theme::parse(raw)
                .ok_or_else(|| anyhow::anyhow!("Unknown theme '{raw}'. Use light or dark"))?;
            tracker.set_theme(theme);
            println!("Theme: {theme}");
        }
    }
    Ok(())
}

fn cli_login(args: &[String], tracker: &mut AppTracker, create: bool) -> Result<()> {
    if let Some(user) = tracker.username() {
        anyhow::bail!("Already signed in as {user}. Run `financepro logout` first");
    }
    let Some(username) = args.first() else {
        anyhow::bail!(
            "Usage: financepro {} <username>",
            if create { "signup" } else { "login" }
        );
    };
    let password = rpassword::prompt_password("Password: ").context("Could not read password")?;

    if create {
        tracker.sign_up(username, &password)?;
    } else {
        tracker.sign_in(username, &password)?;
    }

    println!(
        "Signed in as {}. {} cloud transactions",
        tracker.username().unwrap_or("User"),
        tracker.transactions().len()
    );
    for issue in tracker.issues() {
        eprintln!("Warning: {issue}");
    }
    Ok(())
}

fn cli_logout(tracker: &mut AppTracker) -> Result<()> {
    if !tracker.is_cloud() {
        println!("Not signed in");
        return Ok(());
    }
    tracker.sign_out();
    println!(
        "Signed out. {} local transactions",
        tracker.transactions().len()
    );
    Ok(())
}

fn cli_whoami(tracker: &AppTracker) -> Result<()> {
    match tracker.session() {
        Some(session) => println!(
            "{} ({}), cloud mode",
            tracker.username().unwrap_or("User"),
            session.email
        ),
        None => println!("Guest, local mode"),
    }
    Ok(())
}

fn cli_passwd(tracker: &mut AppTracker) -> Result<()> {
    if !tracker.is_cloud() {
        anyhow::bail!("Sign in to change your password");
    }
    let current = rpassword::prompt_password("Current password: ")
        .context("Could not read password")?;
    let new = rpassword::prompt_password("New password: ").context("Could not read password")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")
        .context("Could not read password")?;
    tracker.change_password(&current, &new, &confirm)?;
    println!("Password updated");
    Ok(())
}

fn cli_sync(tracker: &mut AppTracker) -> Result<()> {
    tracker.resync();
    if let Some(issue) = tracker.issues().last() {
        anyhow::bail!("Sync failed: {issue}");
    }
    println!("Reloaded {} transactions", tracker.transactions().len());
    Ok(())
}

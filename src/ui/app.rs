use chrono::{Local, NaiveDate};

use crate::aggregate::{
    budget_progress, calculate_balance, category_breakdown, monthly_trend, Balance,
    BudgetProgress, CategoryTotal, MonthBucket, TREND_WINDOW,
};
use crate::filter::TransactionQuery;
use crate::models::{Kind, Transaction};
use crate::remote::SqliteRemote;
use crate::sync::Tracker;

pub(crate) type AppTracker = Tracker<SqliteRemote>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Transactions,
    Profile,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Transactions, Self::Profile]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Profile => write!(f, "Profile"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Search,
    Confirm,
    Secret,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Search => write!(f, "SEARCH"),
            Self::Confirm => write!(f, "CONFIRM"),
            Self::Secret => write!(f, "PASSWORD"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteTransaction { id: String, title: String },
    SignOut,
}

/// Which password the masked input is collecting, carrying what was typed
/// in earlier steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SecretPrompt {
    SignIn { username: String },
    SignUp { username: String },
    CurrentPassword,
    NewPassword { current: String },
    ConfirmPassword { current: String, new: String },
}

impl SecretPrompt {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::SignIn { .. } | Self::SignUp { .. } => "Password",
            Self::CurrentPassword => "Current password",
            Self::NewPassword { .. } => "New password",
            Self::ConfirmPassword { .. } => "Confirm new password",
        }
    }
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) today: NaiveDate,
    // Re-read the date on every sync; off when a test pins `today`
    follow_clock: bool,

    // Derived from the tracker whenever its revision moves
    seen_revision: Option<u64>,
    pub(crate) balance: Balance,
    pub(crate) expense_breakdown: Vec<CategoryTotal>,
    pub(crate) income_breakdown: Vec<CategoryTotal>,
    pub(crate) trend: Vec<MonthBucket>,
    pub(crate) budget: BudgetProgress,

    // Transactions
    pub(crate) query: TransactionQuery,
    query_dirty: bool,
    pub(crate) visible: Vec<Transaction>,
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Masked input
    pub(crate) secret_prompt: Option<SecretPrompt>,
    pub(crate) secret_input: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            follow_clock: true,
            ..Self::with_today(Local::now().date_naive())
        }
    }

    pub(crate) fn with_today(today: NaiveDate) -> Self {
        let balance = Balance::default();
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            today,
            follow_clock: false,

            seen_revision: None,
            budget: budget_progress(&balance, rust_decimal::Decimal::ZERO),
            balance,
            expense_breakdown: Vec::new(),
            income_breakdown: Vec::new(),
            trend: Vec::new(),

            query: TransactionQuery::default(),
            query_dirty: true,
            visible: Vec::new(),
            transaction_index: 0,
            transaction_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            secret_prompt: None,
            secret_input: String::new(),

            visible_rows: 20,
        }
    }

    /// Bring derived state up to date. Aggregates are recomputed only when
    /// the tracker changed; the visible list also when the query did.
    pub(crate) fn sync(&mut self, tracker: &AppTracker) {
        if self.follow_clock {
            self.set_today(Local::now().date_naive());
        }
        let revision = tracker.revision();
        let changed = self.seen_revision != Some(revision);
        if changed {
            let txns = tracker.transactions();
            self.balance = calculate_balance(txns);
            self.expense_breakdown = category_breakdown(txns, Kind::Expense);
            self.income_breakdown = category_breakdown(txns, Kind::Income);
            self.trend = monthly_trend(txns, self.today, TREND_WINDOW);
            self.budget = budget_progress(&self.balance, tracker.budget_limit());
            self.seen_revision = Some(revision);
        }
        if changed || self.query_dirty {
            self.visible = self.query.apply(tracker.transactions());
            self.query_dirty = false;
            self.clamp_selection();
        }
    }

    /// Move the reference date. A new day re-anchors the trend window and
    /// the default date of new entries.
    pub(crate) fn set_today(&mut self, today: NaiveDate) {
        if self.today != today {
            self.today = today;
            self.seen_revision = None;
        }
    }

    /// Mutate the query and schedule the visible list for recomputation.
    pub(crate) fn update_query(&mut self, change: impl FnOnce(&mut TransactionQuery)) {
        change(&mut self.query);
        self.query_dirty = true;
        self.transaction_index = 0;
        self.transaction_scroll = 0;
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.visible.get(self.transaction_index)
    }

    fn clamp_selection(&mut self) {
        if self.transaction_index >= self.visible.len() {
            self.transaction_index = self.visible.len().saturating_sub(1);
        }
        if self.transaction_scroll > self.transaction_index {
            self.transaction_scroll = self.transaction_index;
        }
    }

    pub(crate) fn start_secret(&mut self, prompt: SecretPrompt) {
        self.status_message = format!("{}:", prompt.label());
        self.secret_prompt = Some(prompt);
        self.secret_input.clear();
        self.input_mode = InputMode::Secret;
    }

    /// Drop any partially entered passwords.
    pub(crate) fn cancel_secret(&mut self) {
        self.secret_prompt = None;
        self.secret_input.clear();
        self.input_mode = InputMode::Normal;
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

//! The tracker: one transaction list plus the rules for where it comes from
//! and where changes go.
//!
//! Without a session the list lives in local storage and every change
//! rewrites it there. With a session the remote store is the source: the
//! list is fetched on sign-in and each change is applied in memory first,
//! then mirrored with a single remote call. A failed mirror is logged and
//! kept as a [`SyncIssue`]; the in-memory change stands until [`Tracker::resync`].

use rust_decimal::Decimal;
use thiserror::Error;

use crate::auth::{display_username, friendly_auth_message, Credentials, PasswordChange, ValidationError};
use crate::models::{parse_row_values, Theme, Transaction};
use crate::remote::{RemoteError, RemoteStore, Session};
use crate::storage::{LocalStore, KEY_SESSION, KEY_THEME};

pub(crate) const DEFAULT_BUDGET: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Local,
    Cloud(Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncOp {
    Fetch,
    Insert,
    Update,
    Delete,
}

impl SyncOp {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A remote call that failed while the in-memory list moved on without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncIssue {
    pub(crate) op: SyncOp,
    pub(crate) id: Option<String>,
    pub(crate) message: String,
}

impl std::fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} {}: {}", self.op.as_str(), id, self.message),
            None => write!(f, "{}: {}", self.op.as_str(), self.message),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", friendly_auth_message(&.0.to_string()))]
    Remote(#[from] RemoteError),
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Transaction '{0}' not found")]
    NotFound(String),
}

pub(crate) struct Tracker<R: RemoteStore> {
    local: LocalStore,
    remote: R,
    mode: Mode,
    transactions: Vec<Transaction>,
    budget_limit: Decimal,
    theme: Theme,
    issues: Vec<SyncIssue>,
    revision: u64,
}

impl<R: RemoteStore> Tracker<R> {
    /// Load preferences and the local list, then restore a persisted session
    /// if the remote store still knows it.
    pub(crate) fn open(local: LocalStore, remote: R) -> Self {
        let budget_limit = local.load_budget(DEFAULT_BUDGET);
        let theme = local.load(KEY_THEME, Theme::default());
        let transactions = local.load_transactions();
        let token: Option<String> = local.load(KEY_SESSION, None);

        let mut tracker = Self {
            local,
            remote,
            mode: Mode::Local,
            transactions,
            budget_limit,
            theme,
            issues: Vec::new(),
            revision: 0,
        };

        if let Some(token) = token {
            match tracker.remote.get_session(&token) {
                Ok(Some(session)) => {
                    tracing::info!(email = %session.email, "restored session");
                    tracker.handle_session_change(Some(session));
                }
                Ok(None) => {
                    tracing::info!("stored session is no longer valid");
                    tracker.local.remove(KEY_SESSION);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not restore session, staying local");
                }
            }
        }
        tracker
    }

    // ── Accessors ─────────────────────────────────────────────

    pub(crate) fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub(crate) fn budget_limit(&self) -> Decimal {
        self.budget_limit
    }

    pub(crate) fn theme(&self) -> Theme {
        self.theme
    }

    pub(crate) fn mode(&self) -> &Mode {
        &self.mode
    }

    pub(crate) fn session(&self) -> Option<&Session> {
        match &self.mode {
            Mode::Cloud(session) => Some(session),
            Mode::Local => None,
        }
    }

    pub(crate) fn is_cloud(&self) -> bool {
        self.session().is_some()
    }

    pub(crate) fn username(&self) -> Option<&str> {
        self.session().map(|s| display_username(&s.email))
    }

    pub(crate) fn issues(&self) -> &[SyncIssue] {
        &self.issues
    }

    /// Bumped by every change to the list or preferences.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    // ── Transactions ──────────────────────────────────────────

    /// Add a new record at the front of the list.
    pub(crate) fn create(&mut self, txn: Transaction) {
        tracing::debug!(id = %txn.id, "create transaction");
        let row = txn.to_row();
        self.transactions.insert(0, txn);
        self.touch();

        match &self.mode {
            Mode::Local => self.local.save_transactions(&self.transactions),
            Mode::Cloud(session) => {
                let result = self.remote.insert(session, &row);
                record_failure(&mut self.issues, SyncOp::Insert, Some(&row.id), result);
            }
        }
    }

    /// Replace the record with the same id, keeping its position.
    pub(crate) fn update(&mut self, txn: Transaction) -> Result<(), TrackerError> {
        let slot = self
            .transactions
            .iter_mut()
            .find(|t| t.id == txn.id)
            .ok_or_else(|| TrackerError::NotFound(txn.id.clone()))?;
        tracing::debug!(id = %txn.id, "update transaction");
        let row = txn.to_row();
        *slot = txn;
        self.touch();

        match &self.mode {
            Mode::Local => self.local.save_transactions(&self.transactions),
            Mode::Cloud(session) => {
                let result = self.remote.update(session, &row.id, &row);
                record_failure(&mut self.issues, SyncOp::Update, Some(&row.id), result);
            }
        }
        Ok(())
    }

    pub(crate) fn delete(&mut self, id: &str) -> Result<Transaction, TrackerError> {
        let index = self
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        tracing::debug!(id, "delete transaction");
        let removed = self.transactions.remove(index);
        self.touch();

        match &self.mode {
            Mode::Local => self.local.save_transactions(&self.transactions),
            Mode::Cloud(session) => {
                let result = self.remote.delete(session, id);
                record_failure(&mut self.issues, SyncOp::Delete, Some(id), result);
            }
        }
        Ok(removed)
    }

    /// Swap in a whole new list. Written through to local storage in local
    /// mode; in cloud mode only the in-memory list changes.
    pub(crate) fn replace_all(&mut self, txns: Vec<Transaction>) {
        self.transactions = txns;
        self.touch();
        if matches!(self.mode, Mode::Local) {
            self.local.save_transactions(&self.transactions);
        }
    }

    // ── Preferences ───────────────────────────────────────────

    /// Budget and theme are per device and always stored locally.
    pub(crate) fn set_budget(&mut self, limit: Decimal) {
        self.budget_limit = limit;
        self.local.save_budget(limit);
        self.touch();
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.local.save(KEY_THEME, &theme);
        self.touch();
    }

    pub(crate) fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    // ── Session ───────────────────────────────────────────────

    pub(crate) fn sign_in(&mut self, username: &str, password: &str) -> Result<(), TrackerError> {
        let creds = Credentials::new(username, password)?;
        let session = self
            .remote
            .sign_in(&creds.email(), creds.password())
            .inspect_err(|e| tracing::warn!(error = %e, "sign in failed"))?;
        self.handle_session_change(Some(session));
        Ok(())
    }

    pub(crate) fn sign_up(&mut self, username: &str, password: &str) -> Result<(), TrackerError> {
        let creds = Credentials::new(username, password)?;
        let session = self
            .remote
            .sign_up(&creds.email(), creds.password())
            .inspect_err(|e| tracing::warn!(error = %e, "sign up failed"))?;
        self.handle_session_change(Some(session));
        Ok(())
    }

    /// Leave cloud mode. The remote session is revoked on a best-effort basis.
    pub(crate) fn sign_out(&mut self) {
        if let Mode::Cloud(session) = &self.mode {
            if let Err(e) = self.remote.sign_out(session) {
                tracing::warn!(error = %e, "remote sign out failed");
            }
        }
        self.handle_session_change(None);
    }

    pub(crate) fn change_password(
        &mut self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), TrackerError> {
        let change = PasswordChange::new(current, new, confirm)?;
        let session = self.session().cloned().ok_or(TrackerError::NotSignedIn)?;

        let check = self
            .remote
            .sign_in(&session.email, change.current())
            .map_err(|_| TrackerError::WrongPassword)?;
        if let Err(e) = self.remote.sign_out(&check) {
            tracing::debug!(error = %e, "could not revoke verification session");
        }

        self.remote.update_password(&session, change.new_password())?;
        tracing::info!(email = %session.email, "password changed");
        Ok(())
    }

    /// Single entry point for session changes.
    ///
    /// Gaining a session replaces the list with the remote one; local edits
    /// are not merged. Losing it reloads whatever local storage holds.
    pub(crate) fn handle_session_change(&mut self, session: Option<Session>) {
        match session {
            Some(session) => {
                self.local.save(KEY_SESSION, &session.token);
                self.mode = Mode::Cloud(session);
                self.fetch_remote();
            }
            None => {
                self.local.remove(KEY_SESSION);
                self.mode = Mode::Local;
                self.issues.clear();
                self.transactions = self.local.load_transactions();
                self.touch();
            }
        }
    }

    /// Re-read the list from its current source, dropping recorded issues
    /// once the remote copy has been fetched.
    pub(crate) fn resync(&mut self) {
        match self.mode {
            Mode::Cloud(_) => self.fetch_remote(),
            Mode::Local => {
                self.transactions = self.local.load_transactions();
                self.touch();
            }
        }
    }

    fn fetch_remote(&mut self) {
        let Mode::Cloud(session) = &self.mode else {
            return;
        };
        match self.remote.list(session) {
            Ok(values) => {
                self.replace_all(parse_row_values(values, "remote store"));
                self.issues.clear();
                tracing::info!(count = self.transactions.len(), "fetched remote transactions");
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching from remote store");
                self.issues.push(SyncIssue {
                    op: SyncOp::Fetch,
                    id: None,
                    message: e.to_string(),
                });
            }
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    #[cfg(test)]
    pub(crate) fn local(&self) -> &LocalStore {
        &self.local
    }

    #[cfg(test)]
    pub(crate) fn remote(&self) -> &R {
        &self.remote
    }

    #[cfg(test)]
    pub(crate) fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }
}

fn record_failure(
    issues: &mut Vec<SyncIssue>,
    op: SyncOp,
    id: Option<&str>,
    result: Result<(), RemoteError>,
) {
    if let Err(e) = result {
        tracing::error!(op = op.as_str(), id, error = %e, "Error mirroring change to remote store");
        issues.push(SyncIssue {
            op,
            id: id.map(str::to_string),
            message: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests;

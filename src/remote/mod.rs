//! The cloud backend: accounts, sessions and per-user transaction rows.

mod schema;
mod sqlite;

use thiserror::Error;

use crate::models::TransactionRow;

pub(crate) use sqlite::SqliteRemote;

/// Backend messages for the two expected auth failures.
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid login credentials";
pub(crate) const ALREADY_REGISTERED: &str = "User already registered";

/// An authenticated session handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) token: String,
    pub(crate) email: String,
}

#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    /// Rejected credentials; the message comes from the backend unchanged.
    #[error("{0}")]
    Auth(String),
    #[error("session expired or invalid, please sign in again")]
    Unauthorized,
    #[error("transaction '{0}' not found")]
    NotFound(String),
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("remote storage error: {0}")]
    Storage(rusqlite::Error),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// A busy or unreachable file is reported as unavailable so callers can
/// tell it apart from a broken query.
impl From<rusqlite::Error> for RemoteError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
                | rusqlite::ErrorCode::CannotOpen,
            ) => Self::Unavailable(e.to_string()),
            _ => Self::Storage(e),
        }
    }
}

/// Operations the tracker needs from a cloud backend.
///
/// `list` hands back untyped rows so the caller decides what to trust.
pub(crate) trait RemoteStore {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, RemoteError>;
    fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, RemoteError>;
    fn sign_out(&mut self, session: &Session) -> Result<(), RemoteError>;
    /// Resolve a persisted token. `None` when it is unknown or revoked.
    fn get_session(&self, token: &str) -> Result<Option<Session>, RemoteError>;
    fn update_password(&mut self, session: &Session, new_password: &str) -> Result<(), RemoteError>;

    /// All rows of the session's user, newest date first.
    fn list(&self, session: &Session) -> Result<Vec<serde_json::Value>, RemoteError>;
    fn insert(&mut self, session: &Session, row: &TransactionRow) -> Result<(), RemoteError>;
    fn update(&mut self, session: &Session, id: &str, row: &TransactionRow) -> Result<(), RemoteError>;
    fn delete(&mut self, session: &Session, id: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests;

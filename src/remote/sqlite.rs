use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::{schema, RemoteError, RemoteStore, Session, ALREADY_REGISTERED, INVALID_CREDENTIALS};
use crate::models::TransactionRow;
use crate::storage::schema::migrate;

/// A remote store kept in a SQLite file, typically on a shared or synced
/// drive so several devices see the same accounts and rows.
///
/// The file may be out of reach (an unmounted share, a missing folder). The
/// store then stays closed, every call reports `Unavailable`, and signing in
/// or up tries the file again.
pub(crate) struct SqliteRemote {
    path: Option<PathBuf>,
    conn: Option<Connection>,
    bcrypt_cost: u32,
}

fn connect(path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open remote store: {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("Failed to set remote store pragmas")?;
    conn.busy_timeout(Duration::from_secs(2))?;
    migrate(&conn, &schema::REMOTE).context("Remote store migration failed")?;
    Ok(conn)
}

impl SqliteRemote {
    pub(crate) fn open(path: &Path, bcrypt_cost: u32) -> Self {
        let conn = connect(path)
            .inspect_err(|e| tracing::warn!(error = %e, "remote store unavailable"))
            .ok();
        Self {
            path: Some(path.to_path_buf()),
            conn,
            bcrypt_cost,
        }
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory(bcrypt_cost: u32) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrate(&conn, &schema::REMOTE)?;
        Ok(Self {
            path: None,
            conn: Some(conn),
            bcrypt_cost,
        })
    }

    pub(crate) fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Result<&Connection, RemoteError> {
        self.conn.as_ref().ok_or_else(|| {
            let place = self
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            RemoteError::Unavailable(format!("cannot open {place}"))
        })
    }

    /// Retry a store that could not be opened earlier.
    fn reconnect(&mut self) -> Result<&Connection, RemoteError> {
        if self.conn.is_none() {
            if let Some(path) = &self.path {
                match connect(path) {
                    Ok(conn) => {
                        tracing::info!(path = %path.display(), "remote store reachable again");
                        self.conn = Some(conn);
                    }
                    Err(e) => return Err(RemoteError::Unavailable(format!("{e:#}"))),
                }
            }
        }
        self.conn()
    }

    fn user_by_email(&self, email: &str) -> Result<Option<(String, String)>, RemoteError> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    fn user_for(&self, session: &Session) -> Result<String, RemoteError> {
        self.conn()?
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![session.token],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RemoteError::Unauthorized)
    }

    fn start_session(&mut self, user_id: &str, email: &str) -> Result<Session, RemoteError> {
        let token = uuid::Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(Session {
            token,
            email: email.to_string(),
        })
    }
}

impl RemoteStore for SqliteRemote {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.reconnect()?;
        let Some((user_id, hash)) = self.user_by_email(email)? else {
            return Err(RemoteError::Auth(INVALID_CREDENTIALS.to_string()));
        };
        if !bcrypt::verify(password, &hash)? {
            return Err(RemoteError::Auth(INVALID_CREDENTIALS.to_string()));
        }
        tracing::info!(email, "signed in");
        self.start_session(&user_id, email)
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, RemoteError> {
        self.reconnect()?;
        if self.user_by_email(email)?.is_some() {
            return Err(RemoteError::Auth(ALREADY_REGISTERED.to_string()));
        }
        let hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let user_id = uuid::Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, email, hash, chrono::Utc::now().to_rfc3339()],
        )?;
        tracing::info!(email, "account created");
        self.start_session(&user_id, email)
    }

    fn sign_out(&mut self, session: &Session) -> Result<(), RemoteError> {
        self.conn()?.execute(
            "DELETE FROM sessions WHERE token = ?1",
            params![session.token],
        )?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> Result<Option<Session>, RemoteError> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT u.email FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1",
                params![token],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|email| Session {
                token: token.to_string(),
                email,
            }))
    }

    fn update_password(&mut self, session: &Session, new_password: &str) -> Result<(), RemoteError> {
        let user_id = self.user_for(session)?;
        let hash = bcrypt::hash(new_password, self.bcrypt_cost)?;
        self.conn()?.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![hash, user_id],
        )?;
        Ok(())
    }

    fn list(&self, session: &Session) -> Result<Vec<serde_json::Value>, RemoteError> {
        let user_id = self.user_for(session)?;
        let mut stmt = self.conn()?.prepare(
            "SELECT id, title, amount, type, category, date FROM expenses
             WHERE user_id = ?1
             ORDER BY date DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let amount: String = row.get(2)?;
            Ok(serde_json::json!({
                "id": row.get::<_, String>(0)?,
                "title": row.get::<_, String>(1)?,
                "amount": amount_value(amount),
                "type": row.get::<_, String>(3)?,
                "category": row.get::<_, String>(4)?,
                "date": row.get::<_, String>(5)?,
            }))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert(&mut self, session: &Session, row: &TransactionRow) -> Result<(), RemoteError> {
        let user_id = self.user_for(session)?;
        self.conn()?.execute(
            "INSERT INTO expenses (id, user_id, title, amount, type, category, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.id,
                user_id,
                row.title,
                row.amount.to_string(),
                row.kind,
                row.category,
                row.date,
            ],
        )?;
        Ok(())
    }

    fn update(&mut self, session: &Session, id: &str, row: &TransactionRow) -> Result<(), RemoteError> {
        let user_id = self.user_for(session)?;
        let changed = self.conn()?.execute(
            "UPDATE expenses SET title = ?1, amount = ?2, type = ?3, category = ?4, date = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                row.title,
                row.amount.to_string(),
                row.kind,
                row.category,
                row.date,
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Deleting a row that is already gone is not an error.
    fn delete(&mut self, session: &Session, id: &str) -> Result<(), RemoteError> {
        let user_id = self.user_for(session)?;
        self.conn()?.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(())
    }
}

/// Stored decimal text becomes a JSON number with the same digits. Anything
/// else stays a string and is rejected by row validation.
fn amount_value(text: String) -> serde_json::Value {
    Decimal::from_str(&text)
        .ok()
        .and_then(|amount| serde_json::Number::from_str(&amount.to_string()).ok())
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::String(text))
}

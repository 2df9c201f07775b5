//! On-device key/value persistence.
//!
//! Values are stored as JSON text in a single SQLite table. Reads never fail:
//! a missing key, an unreadable row or malformed JSON all yield the caller's
//! fallback. Writes are best effort and only logged when they fail.

pub(crate) mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{parse_row_values, Transaction, TransactionRow};

pub(crate) const KEY_EXPENSES: &str = "expenses";
pub(crate) const KEY_BUDGET: &str = "budget";
pub(crate) const KEY_THEME: &str = "theme";
pub(crate) const KEY_SESSION: &str = "session";

/// Amounts are kept as JSON numbers carrying every stored digit.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct StoredAmount(#[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal);

pub(crate) struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open local store: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set local store pragmas")?;
        schema::migrate(&conn, &schema::LOCAL).context("Local store migration failed")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn, &schema::LOCAL)?;
        Ok(Self { conn })
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Read and decode `key`, or return `fallback`.
    pub(crate) fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return fallback,
            Err(e) => {
                tracing::warn!(key, error = %e, "Error loading from local storage");
                return fallback;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Malformed JSON in local storage, using fallback");
                fallback
            }
        }
    }

    /// Encode and write `value` under `key`. Failures are logged, not returned.
    pub(crate) fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .context("Failed to serialize value")
            .and_then(|raw| self.set_raw(key, &raw));
        if let Err(e) = result {
            tracing::error!(key, error = %e, "Error saving to local storage");
        }
    }

    pub(crate) fn remove(&self, key: &str) {
        if let Err(e) = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
        {
            tracing::error!(key, error = %e, "Error removing key from local storage");
        }
    }

    pub(crate) fn load_budget(&self, fallback: Decimal) -> Decimal {
        self.load(KEY_BUDGET, StoredAmount(fallback)).0
    }

    pub(crate) fn save_budget(&self, limit: Decimal) {
        self.save(KEY_BUDGET, &StoredAmount(limit));
    }

    /// Load the locally stored transaction list, skipping malformed rows.
    pub(crate) fn load_transactions(&self) -> Vec<Transaction> {
        let values: Vec<serde_json::Value> = self.load(KEY_EXPENSES, Vec::new());
        parse_row_values(values, "local storage")
    }

    /// Overwrite the stored transaction list with `txns`.
    pub(crate) fn save_transactions(&self, txns: &[Transaction]) {
        let rows: Vec<TransactionRow> = txns.iter().map(Transaction::to_row).collect();
        self.save(KEY_EXPENSES, &rows);
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::{Entry, Kind};

/// Calendar date format used on the wire and in exports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub entry: Entry,
    pub date: NaiveDate,
}

impl Transaction {
    /// A new record with a freshly generated identifier.
    pub fn new(title: String, amount: Decimal, entry: Entry, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            amount,
            entry,
            date,
        }
    }

    pub fn kind(&self) -> Kind {
        self.entry.kind()
    }

    pub fn is_income(&self) -> bool {
        self.kind() == Kind::Income
    }

    pub fn to_row(&self) -> TransactionRow {
        TransactionRow {
            id: self.id.clone(),
            title: self.title.clone(),
            amount: self.amount,
            kind: self.kind().as_str().to_string(),
            category: self.entry.category_name().to_string(),
            date: self.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Flat representation shared by local storage and the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub title: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub date: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("row has no id")]
    MissingId,
    #[error("amount {0} is negative")]
    NegativeAmount(Decimal),
    #[error("unknown transaction type '{0}'")]
    UnknownKind(String),
    #[error("category '{category}' is not valid for {kind} entries")]
    CategoryMismatch { kind: Kind, category: String },
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RowError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        if row.id.trim().is_empty() {
            return Err(RowError::MissingId);
        }
        if row.amount < Decimal::ZERO {
            return Err(RowError::NegativeAmount(row.amount));
        }
        let kind = Kind::parse(&row.kind).ok_or_else(|| RowError::UnknownKind(row.kind.clone()))?;
        let entry = Entry::from_parts(kind, &row.category).ok_or(RowError::CategoryMismatch {
            kind,
            category: row.category.clone(),
        })?;
        let date = parse_date(&row.date).ok_or_else(|| RowError::InvalidDate(row.date.clone()))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            amount: row.amount,
            entry,
            date,
        })
    }
}

/// Parse a calendar date, tolerating a trailing time component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            let (day, _) = trimmed.split_once('T')?;
            NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
        })
}

/// Validate one untyped row.
pub fn parse_row_value(value: serde_json::Value) -> Result<Transaction, RowError> {
    let row: TransactionRow =
        serde_json::from_value(value).map_err(|e| RowError::Malformed(e.to_string()))?;
    Transaction::try_from(row)
}

/// Validate a batch of untyped rows, logging and skipping the ones that fail.
pub fn parse_row_values(values: Vec<serde_json::Value>, source: &str) -> Vec<Transaction> {
    let mut txns = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match parse_row_value(value) {
            Ok(txn) => txns.push(txn),
            Err(e) => tracing::warn!(source, index, error = %e, "skipping malformed transaction row"),
        }
    }
    txns
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use super::category::{Entry, Kind};
use super::transaction::{parse_date, Transaction};

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Amount is required")]
    MissingAmount,
    #[error("'{0}' is not a number")]
    InvalidAmount(String),
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("'{category}' is not an {kind} category. Choose one of: {choices}")]
    InvalidCategory {
        kind: Kind,
        category: String,
        choices: String,
    },
    #[error("'{0}' is not a valid date. Use YYYY-MM-DD")]
    InvalidDate(String),
    #[error("'{0}' is not a transaction type. Use income or expense")]
    InvalidKind(String),
    #[error("Expected: [YYYY-MM-DD] <income|expense> <category> <amount> <title>")]
    Incomplete,
}

/// Raw text entered for a new or edited transaction.
#[derive(Debug, Clone)]
pub struct TransactionForm {
    pub title: String,
    pub amount: String,
    pub kind: Kind,
    pub category: String,
    /// Empty means today.
    pub date: String,
}

impl TransactionForm {
    pub fn new(kind: Kind) -> Self {
        Self {
            title: String::new(),
            amount: String::new(),
            kind,
            category: kind.default_entry().category_name().to_string(),
            date: String::new(),
        }
    }

    /// Pre-fill the form from an existing record for editing.
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            title: txn.title.clone(),
            amount: txn.amount.to_string(),
            kind: txn.kind(),
            category: txn.entry.category_name().to_string(),
            date: txn.date.format(super::transaction::DATE_FORMAT).to_string(),
        }
    }

    /// Fill a form from `[YYYY-MM-DD] <type> <category> <amount> <title...>`.
    ///
    /// Only the shape is checked here; values are validated by [`Self::parse`].
    pub fn from_words(words: &[&str]) -> Result<Self, FormError> {
        let (date, rest) = match words.split_first() {
            Some((first, rest)) if first.starts_with(|c: char| c.is_ascii_digit()) => {
                (first.to_string(), rest)
            }
            _ => (String::new(), words),
        };
        let [kind, category, amount, title @ ..] = rest else {
            return Err(FormError::Incomplete);
        };
        if title.is_empty() {
            return Err(FormError::Incomplete);
        }
        let kind = Kind::parse(kind).ok_or_else(|| FormError::InvalidKind(kind.to_string()))?;

        Ok(Self {
            title: title.join(" "),
            amount: amount.to_string(),
            kind,
            category: category.to_string(),
            date,
        })
    }

    /// Switch type, resetting the category to the new type's first one.
    pub fn set_kind(&mut self, kind: Kind) {
        if self.kind != kind {
            self.kind = kind;
            self.category = kind.default_entry().category_name().to_string();
        }
    }

    /// Validate into a record. `id` is kept when editing; `None` generates one.
    pub fn parse(&self, id: Option<&str>, today: NaiveDate) -> Result<Transaction, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::MissingTitle);
        }

        let amount = parse_amount(&self.amount)?;

        let entry = Entry::from_parts(self.kind, &self.category).ok_or_else(|| {
            FormError::InvalidCategory {
                kind: self.kind,
                category: self.category.clone(),
                choices: self.kind.category_names().join(", "),
            }
        })?;

        let date = if self.date.trim().is_empty() {
            today
        } else {
            parse_date(&self.date).ok_or_else(|| FormError::InvalidDate(self.date.clone()))?
        };

        let mut txn = Transaction::new(title.to_string(), amount, entry, date);
        if let Some(id) = id {
            txn.id = id.to_string();
        }
        Ok(txn)
    }
}

/// Parse free-form amount text such as `12.50`, `$1,200` or `1e3`.
pub fn parse_amount(s: &str) -> Result<Decimal, FormError> {
    let cleaned = s.replace(['$', ','], "").trim().to_string();
    if cleaned.is_empty() {
        return Err(FormError::MissingAmount);
    }
    let amount = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| FormError::InvalidAmount(s.trim().to_string()))?;
    if amount < Decimal::ZERO {
        return Err(FormError::NegativeAmount);
    }
    Ok(amount)
}

//! Read-only summaries derived from the transaction list.
//!
//! Everything here is a pure function of its inputs and is recomputed
//! whenever the list changes; nothing is persisted.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{Entry, Kind, Transaction};

/// Chart colors, assigned by category position.
pub(crate) const PALETTE: [&str; 6] = [
    "#6366f1", "#8b5cf6", "#ec4899", "#f43f5e", "#f97316", "#eab308",
];

pub(crate) const TREND_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Balance {
    pub(crate) income: Decimal,
    pub(crate) expense: Decimal,
    pub(crate) balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub(crate) entry: Entry,
    pub(crate) total: Decimal,
    pub(crate) color_index: usize,
}

impl CategoryTotal {
    pub(crate) fn name(&self) -> &'static str {
        self.entry.category_name()
    }

    pub(crate) fn color(&self) -> &'static str {
        PALETTE[self.color_index]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthBucket {
    /// Abbreviated month name, e.g. "Jan".
    pub(crate) label: String,
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) income: Decimal,
    pub(crate) expense: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BudgetProgress {
    pub(crate) spent: Decimal,
    pub(crate) limit: Decimal,
    /// Share of the limit used, capped at 100.
    pub(crate) percent: Decimal,
    pub(crate) remaining: Decimal,
}

impl BudgetProgress {
    pub(crate) fn is_exhausted(&self) -> bool {
        self.percent >= Decimal::ONE_HUNDRED
    }
}

pub(crate) fn calculate_balance(txns: &[Transaction]) -> Balance {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for txn in txns {
        match txn.kind() {
            Kind::Income => income += txn.amount,
            Kind::Expense => expense += txn.amount,
        }
    }
    Balance {
        income,
        expense,
        balance: income - expense,
    }
}

/// Per-category totals for one kind, in the kind's fixed category order.
/// Categories with nothing recorded are left out.
pub(crate) fn category_breakdown(txns: &[Transaction], kind: Kind) -> Vec<CategoryTotal> {
    Entry::all_for(kind)
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let total = txns
                .iter()
                .filter(|t| t.entry == entry)
                .map(|t| t.amount)
                .sum();
            CategoryTotal {
                entry,
                total,
                color_index: index % PALETTE.len(),
            }
        })
        .filter(|c| c.total > Decimal::ZERO)
        .collect()
}

/// Income and expense per calendar month for the `window` months ending with
/// `today`'s month, oldest first.
pub(crate) fn monthly_trend(txns: &[Transaction], today: NaiveDate, window: usize) -> Vec<MonthBucket> {
    let this_month = today.with_day(1).unwrap_or(today);

    (0..window)
        .rev()
        .map(|back| {
            let start = this_month
                .checked_sub_months(Months::new(back as u32))
                .unwrap_or(this_month);
            let (year, month) = (start.year(), start.month());

            let mut income = Decimal::ZERO;
            let mut expense = Decimal::ZERO;
            for txn in txns
                .iter()
                .filter(|t| t.date.year() == year && t.date.month() == month)
            {
                match txn.kind() {
                    Kind::Income => income += txn.amount,
                    Kind::Expense => expense += txn.amount,
                }
            }

            MonthBucket {
                label: start.format("%b").to_string(),
                year,
                month,
                income,
                expense,
            }
        })
        .collect()
}

pub(crate) fn budget_progress(balance: &Balance, limit: Decimal) -> BudgetProgress {
    let spent = balance.expense;
    let percent = if limit > Decimal::ZERO {
        spent
            .checked_div(limit)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |p| p.min(Decimal::ONE_HUNDRED))
    } else if spent > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    BudgetProgress {
        spent,
        limit,
        percent,
        remaining: (limit - spent).max(Decimal::ZERO),
    }
}

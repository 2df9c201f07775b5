mod category;
mod form;
mod theme;
mod transaction;

pub use category::{Entry, Kind};
pub use form::{parse_amount, TransactionForm};
pub use theme::Theme;
pub use transaction::{parse_row_values, Transaction, TransactionRow, DATE_FORMAT};

// Named directly only by tests; the rest of the crate goes through `Entry`.
#[cfg(test)]
pub use category::{ExpenseCategory, IncomeCategory};
#[cfg(test)]
pub use form::FormError;
#[cfg(test)]
pub use transaction::RowError;

//! Search, type filter and ordering for the transaction list.

use crate::models::{Kind, Transaction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum KindFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl KindFilter {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "a" => Some(Self::All),
            other => Kind::parse(other).map(Self::from),
        }
    }

    pub(crate) fn matches(&self, kind: Kind) -> bool {
        match self {
            Self::All => true,
            Self::Income => kind == Kind::Income,
            Self::Expense => kind == Kind::Expense,
        }
    }

    pub(crate) fn next(&self) -> Self {
        match self {
            Self::All => Self::Income,
            Self::Income => Self::Expense,
            Self::Expense => Self::All,
        }
    }
}

impl From<Kind> for KindFilter {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => Self::Income,
            Kind::Expense => Self::Expense,
        }
    }
}

impl std::fmt::Display for KindFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Highest,
}

impl SortOrder {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Highest => "highest",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "newest" | "new" | "n" => Some(Self::Newest),
            "oldest" | "old" | "o" => Some(Self::Oldest),
            "highest" | "high" | "h" | "amount" => Some(Self::Highest),
            _ => None,
        }
    }

    pub(crate) fn next(&self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::Highest,
            Self::Highest => Self::Newest,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TransactionQuery {
    pub(crate) search: String,
    pub(crate) kind: KindFilter,
    pub(crate) order: SortOrder,
}

impl TransactionQuery {
    pub(crate) fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Apply search, then the type filter, then the ordering. The input is
    /// left untouched.
    pub(crate) fn apply(&self, txns: &[Transaction]) -> Vec<Transaction> {
        let needle = self.search.to_lowercase();
        let mut out: Vec<Transaction> = txns
            .iter()
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .filter(|t| self.kind.matches(t.kind()))
            .cloned()
            .collect();

        // sort_by is stable: ties keep their list order.
        match self.order {
            SortOrder::Newest => out.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::Oldest => out.sort_by(|a, b| a.date.cmp(&b.date)),
            SortOrder::Highest => out.sort_by(|a, b| b.amount.cmp(&a.amount)),
        }
        out
    }
}

/// Which side of the ledger a transaction sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "inc" | "i" => Some(Self::Income),
            "expense" | "exp" | "e" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Display names of this kind's categories, in fixed order.
    pub fn category_names(&self) -> Vec<&'static str> {
        match self {
            Self::Income => IncomeCategory::all().iter().map(|c| c.as_str()).collect(),
            Self::Expense => ExpenseCategory::all().iter().map(|c| c.as_str()).collect(),
        }
    }

    /// The category a fresh form starts with for this kind.
    pub fn default_entry(&self) -> Entry {
        match self {
            Self::Income => Entry::Income(IncomeCategory::Salary),
            Self::Expense => Entry::Expense(ExpenseCategory::Food),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncomeCategory {
    Salary,
    Freelance,
    Other,
}

impl IncomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salary => "Salary",
            Self::Freelance => "Freelance",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn all() -> &'static [IncomeCategory] {
        &[Self::Salary, Self::Freelance, Self::Other]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::Food,
            Self::Transport,
            Self::Shopping,
            Self::Bills,
            Self::Entertainment,
            Self::Other,
        ]
    }
}

/// A transaction's type together with its category.
///
/// Each variant carries only the categories valid for it, so an expense can
/// never hold `Salary` and an income can never hold `Food`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    Income(IncomeCategory),
    Expense(ExpenseCategory),
}

impl Entry {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Income(_) => Kind::Income,
            Self::Expense(_) => Kind::Expense,
        }
    }

    pub fn category_name(&self) -> &'static str {
        match self {
            Self::Income(c) => c.as_str(),
            Self::Expense(c) => c.as_str(),
        }
    }

    /// Build an entry from a kind and a category name, rejecting names that
    /// do not belong to the kind.
    pub fn from_parts(kind: Kind, category: &str) -> Option<Self> {
        match kind {
            Kind::Income => IncomeCategory::parse(category).map(Self::Income),
            Kind::Expense => ExpenseCategory::parse(category).map(Self::Expense),
        }
    }

    /// Every valid entry for a kind, in display order.
    pub fn all_for(kind: Kind) -> Vec<Entry> {
        match kind {
            Kind::Income => IncomeCategory::all().iter().map(|c| Self::Income(*c)).collect(),
            Kind::Expense => ExpenseCategory::all()
                .iter()
                .map(|c| Self::Expense(*c))
                .collect(),
        }
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category_name())
    }
}

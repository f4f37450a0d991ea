//! Date-range and category filtering over the ledger store.

use chrono::NaiveDate;

use crate::ledger::{Category, Expense};

/// Filter applied when listing an owner's expenses. An empty filter matches
/// the entire ledger; the date range is inclusive on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseFilter {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub category: Option<Category>,
}

impl ExpenseFilter {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            date_range: Some((start, end)),
            category: None,
        }
    }

    pub fn by_category(category: Category) -> Self {
        Self {
            date_range: None,
            category: Some(category),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some((start, end)) = self.date_range {
            let date = expense.date.date_naive();
            if date < start || date > end {
                return false;
            }
        }
        if let Some(category) = self.category {
            if expense.category != category {
                return false;
            }
        }
        true
    }
}

/// Newest first: effective date descending, ties broken by creation time
/// descending.
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

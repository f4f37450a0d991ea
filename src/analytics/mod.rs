//! Category aggregation, month-over-month comparison, and insight
//! derivation over the ledger store.

pub mod insights;

pub use insights::{percent_change, round_to};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::ledger::{Category, LedgerStore};
use crate::query::ExpenseFilter;

/// Per-category aggregate within a window.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: u64,
}

/// Aggregates for one calendar window, both bounds inclusive.
///
/// `by_category` lists categories in first-encounter order over the
/// window's expenses; categories with no matching records are omitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub by_category: Vec<CategoryTotal>,
    pub total: f64,
}

impl MonthSummary {
    pub fn category_total(&self, category: Category) -> Option<&CategoryTotal> {
        self.by_category.iter().find(|c| c.category == category)
    }
}

/// Derived snapshot, recomputed per request and never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub current: MonthSummary,
    /// Current total divided by the reference day-of-month, two decimals.
    pub daily_average: f64,
    pub last: MonthSummary,
    pub insights: Vec<String>,
}

/// Computes the current-month/last-month comparison for `owner` as of
/// `reference`.
pub fn report(store: &LedgerStore, owner: Uuid, reference: DateTime<Utc>) -> Result<AnalyticsReport> {
    let today = reference.date_naive();
    let current = summarize(store, owner, first_of_month(today), today)?;
    let (last_start, last_end) = previous_month(today);
    let last = summarize(store, owner, last_start, last_end)?;

    let daily_average = round_to(current.total / f64::from(today.day()), 2);
    let insights = derive_insights(&current, &last);

    Ok(AnalyticsReport {
        current,
        daily_average,
        last,
        insights,
    })
}

fn summarize(
    store: &LedgerStore,
    owner: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MonthSummary> {
    let expenses = store.list(owner, &ExpenseFilter::between(start, end))?;
    let mut by_category: Vec<CategoryTotal> = Vec::new();
    for expense in &expenses {
        match by_category
            .iter_mut()
            .find(|slot| slot.category == expense.category)
        {
            Some(slot) => {
                slot.total += expense.amount;
                slot.count += 1;
            }
            None => by_category.push(CategoryTotal {
                category: expense.category,
                total: expense.amount,
                count: 1,
            }),
        }
    }
    let total = by_category.iter().map(|slot| slot.total).sum();
    Ok(MonthSummary {
        start,
        end,
        by_category,
        total,
    })
}

/// Overall change first, then per-category increases in the current month's
/// aggregation order. Thresholds apply to the rounded change.
fn derive_insights(current: &MonthSummary, last: &MonthSummary) -> Vec<String> {
    let mut insights = Vec::new();

    if last.total > 0.0 {
        let change = percent_change(current.total, last.total);
        if change > 0.0 {
            insights.push(format!(
                "You spent {change:.1}% more this month compared to last month"
            ));
        } else if change < 0.0 {
            insights.push(format!(
                "You saved {:.1}% this month compared to last month",
                change.abs()
            ));
        }
    }

    for slot in &current.by_category {
        let Some(previous) = last.category_total(slot.category) else {
            continue;
        };
        if previous.total <= 0.0 {
            continue;
        }
        let change = percent_change(slot.total, previous.total);
        if change > 20.0 {
            insights.push(format!(
                "You spent {change:.1}% more on {} this month",
                slot.category
            ));
        }
    }

    insights
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn previous_month(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let last_of_previous = first_of_month(date) - Duration::days(1);
    (first_of_month(last_of_previous), last_of_previous)
}

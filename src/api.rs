//! Wire-shaped request handling for the (external) transport layer.
//!
//! Shapes responses the way the HTTP surface expects them without owning
//! any framing or routing. Every call requires an authenticated owner;
//! a missing identity maps to 401, a missing record to 404, and all other
//! failures to 500.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{self, CategoryTotal};
use crate::errors::LedgerError;
use crate::ledger::{Category, Expense, ExpenseDraft, LedgerStore};
use crate::query::ExpenseFilter;

/// Error shaped for the wire: a status code plus a message body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::NotFound(_) => 404,
            LedgerError::Unauthorized => 401,
            _ => 500,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Query-string shaped list filters. The date bounds apply only when both
/// are present; an unknown category is rejected rather than ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub current_month: CurrentMonthBlock,
    pub last_month: LastMonthBlock,
    pub insights: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMonthBlock {
    pub total: f64,
    pub by_category: Vec<CategoryTotal>,
    pub daily_average: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMonthBlock {
    pub total: f64,
    pub by_category: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub category: Category,
    pub total: f64,
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub synced: usize,
    pub failed: usize,
}

pub fn list_expenses(
    store: &LedgerStore,
    owner: Option<Uuid>,
    query: &ListQuery,
) -> ApiResult<Vec<Expense>> {
    let owner = require_owner(owner)?;
    let filter = filter_from(query)?;
    Ok(store.list(owner, &filter)?)
}

pub fn create_expense(
    store: &LedgerStore,
    owner: Option<Uuid>,
    draft: ExpenseDraft,
) -> ApiResult<Expense> {
    let owner = require_owner(owner)?;
    Ok(store.create(owner, draft)?)
}

pub fn update_expense(
    store: &LedgerStore,
    owner: Option<Uuid>,
    id: Uuid,
    draft: ExpenseDraft,
) -> ApiResult<Expense> {
    let owner = require_owner(owner)?;
    Ok(store.update(owner, id, draft)?)
}

pub fn delete_expense(store: &LedgerStore, owner: Option<Uuid>, id: Uuid) -> ApiResult<()> {
    let owner = require_owner(owner)?;
    Ok(store.delete(owner, id)?)
}

/// Current/last month comparison as of the server clock.
pub fn analytics(store: &LedgerStore, owner: Option<Uuid>) -> ApiResult<AnalyticsResponse> {
    analytics_at(store, owner, Utc::now())
}

pub fn analytics_at(
    store: &LedgerStore,
    owner: Option<Uuid>,
    reference: DateTime<Utc>,
) -> ApiResult<AnalyticsResponse> {
    let owner = require_owner(owner)?;
    let report = analytics::report(store, owner, reference)?;
    Ok(AnalyticsResponse {
        current_month: CurrentMonthBlock {
            total: report.current.total,
            by_category: report.current.by_category,
            daily_average: report.daily_average,
        },
        last_month: LastMonthBlock {
            total: report.last.total,
            by_category: report.last.by_category,
        },
        insights: report.insights,
    })
}

/// All of one category, newest first, with the running total.
pub fn category_expenses(
    store: &LedgerStore,
    owner: Option<Uuid>,
    category: &str,
) -> ApiResult<CategoryResponse> {
    let owner = require_owner(owner)?;
    let category: Category = category.parse().map_err(ApiError::from)?;
    let expenses = store.list(owner, &ExpenseFilter::by_category(category))?;
    let total = expenses.iter().map(|expense| expense.amount).sum();
    Ok(CategoryResponse {
        category,
        total,
        expenses,
    })
}

/// Bulk-creates queued payloads. Partial failures still report the partial
/// success; rejected payloads are counted, not resubmitted here.
pub fn sync_expenses(
    store: &LedgerStore,
    owner: Option<Uuid>,
    payloads: Vec<ExpenseDraft>,
) -> ApiResult<SyncResponse> {
    let owner = require_owner(owner)?;
    let mut response = SyncResponse {
        synced: 0,
        failed: 0,
    };
    for payload in payloads {
        match store.create(owner, payload) {
            Ok(_) => response.synced += 1,
            Err(err) => {
                response.failed += 1;
                tracing::warn!(error = %err, "sync payload rejected");
            }
        }
    }
    Ok(response)
}

fn require_owner(owner: Option<Uuid>) -> ApiResult<Uuid> {
    owner.ok_or_else(|| ApiError::from(LedgerError::Unauthorized))
}

fn filter_from(query: &ListQuery) -> ApiResult<ExpenseFilter> {
    let mut filter = ExpenseFilter::default();
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        filter.date_range = Some((start, end));
    }
    if let Some(raw) = query.category.as_deref() {
        filter.category = Some(raw.parse().map_err(ApiError::from)?);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentMethod;
    use crate::storage::MemoryBackend;

    fn store() -> LedgerStore {
        LedgerStore::new(Box::new(MemoryBackend::new()))
    }

    fn draft(amount: f64, category: Category) -> ExpenseDraft {
        ExpenseDraft::new(amount, category, PaymentMethod::Card)
    }

    #[test]
    fn missing_identity_maps_to_401() {
        let store = store();
        let err = list_expenses(&store, None, &ListQuery::default()).expect_err("401");
        assert_eq!(err.status, 401);
    }

    #[test]
    fn missing_record_maps_to_404() {
        let store = store();
        let owner = Some(Uuid::new_v4());
        let err = delete_expense(&store, owner, Uuid::new_v4()).expect_err("404");
        assert_eq!(err.status, 404);
    }

    #[test]
    fn validation_failure_maps_to_500() {
        let store = store();
        let owner = Some(Uuid::new_v4());
        let err = create_expense(&store, owner, draft(-1.0, Category::Food)).expect_err("500");
        assert_eq!(err.status, 500);
    }

    #[test]
    fn unknown_category_filter_is_rejected() {
        let store = store();
        let owner = Some(Uuid::new_v4());
        let query = ListQuery {
            category: Some("Groceries".into()),
            ..ListQuery::default()
        };
        let err = list_expenses(&store, owner, &query).expect_err("rejected");
        assert_eq!(err.status, 500);
        assert!(err.message.contains("unknown category"));
    }

    #[test]
    fn category_endpoint_reports_total_and_records() {
        let store = store();
        let owner = Uuid::new_v4();
        store.create(owner, draft(30.0, Category::Food)).unwrap();
        store.create(owner, draft(20.0, Category::Food)).unwrap();
        store.create(owner, draft(99.0, Category::Bills)).unwrap();

        let response = category_expenses(&store, Some(owner), "Food").expect("response");
        assert_eq!(response.total, 50.0);
        assert_eq!(response.expenses.len(), 2);
    }

    #[test]
    fn sync_reports_partial_success() {
        let store = store();
        let owner = Uuid::new_v4();
        let payloads = vec![
            draft(10.0, Category::Food),
            draft(-2.0, Category::Food),
            draft(5.0, Category::Other),
        ];
        let response = sync_expenses(&store, Some(owner), payloads).expect("response");
        assert_eq!(response.synced, 2);
        assert_eq!(response.failed, 1);
    }
}

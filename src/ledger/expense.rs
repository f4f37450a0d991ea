use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::errors::LedgerError;

/// Closed set of spending categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Health,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Bills,
        Category::Entertainment,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| LedgerError::Validation(format!("unknown category `{value}`")))
    }
}

/// Closed set of payment methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Cash,
    Card,
    #[serde(rename = "UPI")]
    Upi,
    NetBanking,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::NetBanking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "NetBanking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == value)
            .ok_or_else(|| LedgerError::Validation(format!("unknown payment method `{value}`")))
    }
}

/// Canonical expense record. `id` and the timestamps are store-managed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub amount: f64,
    pub category: Category,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub(crate) fn from_draft(owner_id: Uuid, draft: ExpenseDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            amount: draft.amount,
            category: draft.category,
            payment_method: draft.payment_method,
            description: draft.description,
            date: draft.date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole-record overwrite of the caller-supplied fields. A missing
    /// effective date keeps the stored one.
    pub(crate) fn apply_draft(&mut self, draft: ExpenseDraft) {
        self.amount = draft.amount;
        self.category = draft.category;
        self.payment_method = draft.payment_method;
        self.description = draft.description;
        if let Some(date) = draft.date {
            self.date = date;
        }
        self.updated_at = Utc::now();
    }
}

/// Candidate expense fields, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: Category,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseDraft {
    pub fn new(amount: f64, category: Category, payment_method: PaymentMethod) -> Self {
        Self {
            amount,
            category,
            payment_method,
            description: String::new(),
            date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Fails fast before any persistence happens.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "amount must be a positive number, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

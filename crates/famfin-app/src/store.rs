//! Expense storage seam.
//!
//! The relational store client lives outside this repository; the
//! application only sees [`ExpenseStore`]. [`MemoryStore`] backs local
//! development and tests.

use std::sync::Arc;

use chrono::NaiveDate;
use famfin_async::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Calendar date format of an expense entry.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request body of `POST /api/expenses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    pub date: String,
    pub category_id: String,
    pub payment_method_id: String,
    #[serde(default)]
    pub description: String,
}

impl NewExpense {
    /// Field checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err("amount must be a positive number".to_string());
        }
        if NaiveDate::parse_from_str(&self.date, DATE_FORMAT).is_err() {
            return Err("date must be a calendar date formatted as YYYY-MM-DD".to_string());
        }
        if self.category_id.trim().is_empty() || self.payment_method_id.trim().is_empty() {
            return Err("category_id and payment_method_id are required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    #[serde(flatten)]
    pub entry: NewExpense,
}

pub trait ExpenseStore: Send + Sync {
    fn insert(&self, expense: NewExpense) -> BoxFuture<'_, Result<Expense, StoreError>>;
}

/// In-process expense list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    expenses: Arc<RwLock<Vec<Expense>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.expenses.read().await.len()
    }
}

impl ExpenseStore for MemoryStore {
    fn insert(&self, expense: NewExpense) -> BoxFuture<'_, Result<Expense, StoreError>> {
        Box::pin(async move {
            let mut expenses = self.expenses.write().await;
            let expense = Expense {
                id: expenses.len() as u64 + 1,
                entry: expense,
            };
            expenses.push(expense.clone());
            Ok(expense)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, date: &str) -> NewExpense {
        NewExpense {
            amount,
            date: date.to_string(),
            category_id: "groceries".to_string(),
            payment_method_id: "card".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_entry() {
        assert!(expense(12.5, "2024-03-09").validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_amount_and_date() {
        assert!(expense(0.0, "2024-03-09").validate().is_err());
        assert!(expense(-3.0, "2024-03-09").validate().is_err());
        assert!(expense(f64::NAN, "2024-03-09").validate().is_err());
        assert!(expense(1.0, "09/03/2024").validate().is_err());
        assert!(expense(1.0, "2024-13-01").validate().is_err());
        assert!(expense(1.0, "2023-02-31").validate().is_err());
        assert!(expense(1.0, "2023-02-29").validate().is_err());
        assert!(expense(1.0, "2024-02-29").validate().is_ok());
    }

    #[tokio::test]
    async fn memory_store_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store.insert(expense(1.0, "2024-01-01")).await.unwrap();
        let second = store.insert(expense(2.0, "2024-01-02")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn expense_serializes_flat() {
        let value = serde_json::to_value(Expense {
            id: 7,
            entry: expense(4.0, "2024-05-05"),
        })
        .unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["amount"], 4.0);
        assert_eq!(value["category_id"], "groceries");
    }
}

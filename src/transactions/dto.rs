use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::TxnKind;
use crate::transactions::repo::TransactionRow;

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub category: Uuid,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<TxnKind>,
    pub category: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

/// Query-string filters for the transaction listing.
#[derive(Debug, Deserialize, Default)]
pub struct TransactionQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, Default)]
pub struct SummaryQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub amount: f64,
    pub category: Option<Uuid>,
    pub category_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<TransactionRow> for TransactionResponse {
    fn from(t: TransactionRow) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            amount: t.amount,
            category: t.category_id,
            category_name: t.category_name.unwrap_or_else(|| "Unknown".into()),
            date: t.occurred_at,
            notes: t.notes,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryResponse {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl SummaryResponse {
    pub fn new(income: f64, expense: f64) -> Self {
        Self {
            income,
            expense,
            balance: income - expense,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_is_income_minus_expense() {
        let s = SummaryResponse::new(5000.0, 3000.0);
        assert_eq!(s.balance, 2000.0);
    }

    #[test]
    fn balance_may_be_negative() {
        let s = SummaryResponse::new(100.0, 250.5);
        assert_eq!(s.balance, -150.5);
    }

    #[test]
    fn empty_groups_contribute_zero() {
        let s = SummaryResponse::new(0.0, 0.0);
        assert_eq!(s.income, 0.0);
        assert_eq!(s.expense, 0.0);
        assert_eq!(s.balance, 0.0);
    }

    #[test]
    fn missing_category_serializes_as_unknown() {
        use crate::models::TxnKind;
        use time::macros::datetime;

        let row = TransactionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: None,
            category_name: None,
            kind: TxnKind::Expense,
            amount: 42.0,
            occurred_at: datetime!(2025-08-01 10:00 UTC),
            notes: None,
            created_at: datetime!(2025-08-01 10:00 UTC),
        };
        let resp = TransactionResponse::from(row);
        assert_eq!(resp.category_name, "Unknown");
        assert_eq!(resp.category, None);
    }
}

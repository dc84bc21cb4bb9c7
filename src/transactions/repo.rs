use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{DateRange, TxnKind};

/// Transaction row joined with its category name. `category_name` is NULL
/// when the referenced category has since been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub kind: TxnKind,
    pub amount: f64,
    pub occurred_at: OffsetDateTime,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

const SELECT_JOINED: &str = r#"
    SELECT t.id, t.user_id, t.category_id, c.name AS category_name,
           t.kind, t.amount, t.occurred_at, t.notes, t.created_at
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

impl TransactionRow {
    /// Owner-scoped listing with optional date/kind/category filters,
    /// newest first.
    pub async fn list(
        db: &PgPool,
        user_id: Uuid,
        range: DateRange,
        kind: Option<TxnKind>,
        category_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            {SELECT_JOINED}
            WHERE t.user_id = $1
              AND ($2::timestamptz IS NULL OR t.occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR t.occurred_at < $3)
              AND ($4::txn_kind IS NULL OR t.kind = $4)
              AND ($5::uuid IS NULL OR t.category_id = $5)
            ORDER BY t.occurred_at DESC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(user_id)
        .bind(range.start)
        .bind(range.end_exclusive)
        .bind(kind)
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// The whole date-bounded set, unpaginated, for report generation.
    pub async fn list_for_report(
        db: &PgPool,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            {SELECT_JOINED}
            WHERE t.user_id = $1
              AND ($2::timestamptz IS NULL OR t.occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR t.occurred_at < $3)
            ORDER BY t.occurred_at DESC
            "#
        ))
        .bind(user_id)
        .bind(range.start)
        .bind(range.end_exclusive)
        .fetch_all(db)
        .await
    }

    pub async fn find(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            {SELECT_JOINED}
            WHERE t.id = $1 AND t.user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        category_id: Uuid,
        kind: TxnKind,
        amount: f64,
        occurred_at: OffsetDateTime,
        notes: Option<&str>,
    ) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transactions (user_id, category_id, kind, amount, occurred_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(category_id)
        .bind(kind)
        .bind(amount)
        .bind(occurred_at)
        .bind(notes)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        category_id: Uuid,
        kind: TxnKind,
        amount: f64,
        occurred_at: OffsetDateTime,
        notes: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            r#"
            UPDATE transactions
            SET category_id = $3, kind = $4, amount = $5, occurred_at = $6, notes = $7
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(category_id)
        .bind(kind)
        .bind(amount)
        .bind(occurred_at)
        .bind(notes)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }

    /// Single-pass grouped sum over the filtered set. Types with no matching
    /// rows sum to 0 via COALESCE.
    pub async fn summary(
        db: &PgPool,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<(f64, f64), sqlx::Error> {
        sqlx::query_as::<_, (f64, f64)>(
            r#"
            SELECT COALESCE(SUM(amount) FILTER (WHERE kind = 'income'),  0)::float8,
                   COALESCE(SUM(amount) FILTER (WHERE kind = 'expense'), 0)::float8
            FROM transactions
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR occurred_at < $3)
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end_exclusive)
        .fetch_one(db)
        .await
    }
}

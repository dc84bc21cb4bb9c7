use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::TxnKind;

/// Category record. `user_id` is NULL for the shared defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub kind: TxnKind,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, name, kind, color, icon, is_default, created_at";

impl Category {
    /// Defaults plus the user's own categories, optionally restricted by kind.
    pub async fn list_visible(
        db: &PgPool,
        user_id: Uuid,
        kind: Option<TxnKind>,
    ) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM categories
            WHERE (user_id = $1 OR user_id IS NULL)
              AND ($2::txn_kind IS NULL OR kind = $2)
            ORDER BY name
            "#
        ))
        .bind(user_id)
        .bind(kind)
        .fetch_all(db)
        .await
    }

    /// A category the user may reference: a default or one of their own.
    pub async fn find_visible(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM categories
            WHERE id = $1 AND (user_id = $2 OR user_id IS NULL)
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Case-insensitive name collision check across the visible scope.
    /// The partial unique indexes backstop the race between concurrent creates.
    pub async fn name_taken(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        kind: TxnKind,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE lower(name) = lower($1)
                  AND kind = $2
                  AND (user_id = $3 OR user_id IS NULL)
            )
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        kind: TxnKind,
        color: &str,
        icon: &str,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (user_id, name, kind, color, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(kind)
        .bind(color)
        .bind(icon)
        .fetch_one(db)
        .await
    }

    /// Update an owned, non-default category. Ownership is re-checked in SQL.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        name: &str,
        color: &str,
        icon: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $3, color = $4, icon = $5
            WHERE id = $1 AND user_id = $2 AND NOT is_default
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .bind(icon)
        .fetch_optional(db)
        .await
    }

    /// Delete an owned, non-default category. Transactions referencing it keep
    /// a NULL category and report as "Unknown".
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = $1 AND user_id = $2 AND NOT is_default
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }
}

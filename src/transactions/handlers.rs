use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    categories::repo::Category,
    error::ApiError,
    models::{DateRange, TxnKind},
    state::AppState,
    transactions::{
        dto::{
            CreateTransactionRequest, SummaryQuery, SummaryResponse, TransactionQuery,
            TransactionResponse, UpdateTransactionRequest,
        },
        repo::TransactionRow,
    },
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/summary", get(summary))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::bad_request("Amount must be a positive number"));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;
    // Unrecognized type values are ignored; the category filter is an opaque
    // id match with no existence check.
    let kind = q.kind.as_deref().and_then(TxnKind::parse);
    let limit = q.limit.clamp(1, 500);
    let offset = q.offset.max(0);

    let rows =
        TransactionRow::list(&state.db, user_id, range, kind, q.category, limit, offset).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let range = DateRange::parse(q.start_date.as_deref(), q.end_date.as_deref())?;
    let (income, expense) = TransactionRow::summary(&state.db, user_id, range).await?;
    Ok(Json(SummaryResponse::new(income, expense)))
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    validate_amount(payload.amount)?;

    // Category must exist and be visible to the caller at write time.
    if Category::find_visible(&state.db, user_id, payload.category)
        .await?
        .is_none()
    {
        warn!(%user_id, category_id = %payload.category, "create with unknown category");
        return Err(ApiError::not_found("Category not found"));
    }

    let occurred_at = payload.date.unwrap_or_else(time::OffsetDateTime::now_utc);
    let notes = payload.notes.as_deref().filter(|n| !n.trim().is_empty());

    let id = TransactionRow::create(
        &state.db,
        user_id,
        payload.category,
        payload.kind,
        payload.amount,
        occurred_at,
        notes,
    )
    .await?;

    let row = TransactionRow::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    info!(%user_id, transaction_id = %id, "transaction created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let row = TransactionRow::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;
    Ok(Json(row.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let current = TransactionRow::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    let amount = payload.amount.unwrap_or(current.amount);
    validate_amount(amount)?;

    let category_id = match payload.category {
        Some(c) => c,
        // A transaction whose category was deleted must be re-pointed at a
        // live category before other fields can change.
        None => current
            .category_id
            .ok_or_else(|| ApiError::bad_request("Category is required"))?,
    };
    if Category::find_visible(&state.db, user_id, category_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Category not found"));
    }

    let kind = payload.kind.unwrap_or(current.kind);
    let occurred_at = payload.date.unwrap_or(current.occurred_at);
    let notes = payload.notes.or(current.notes);
    let notes = notes.as_deref().filter(|n| !n.trim().is_empty());

    let updated = TransactionRow::update(
        &state.db,
        user_id,
        id,
        category_id,
        kind,
        amount,
        occurred_at,
        notes,
    )
    .await?;
    if updated == 0 {
        return Err(ApiError::not_found("Transaction not found"));
    }

    let row = TransactionRow::find(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    info!(%user_id, transaction_id = %id, "transaction updated");
    Ok(Json(row.into()))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = TransactionRow::delete(&state.db, user_id, id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Transaction not found"));
    }

    info!(%user_id, transaction_id = %id, "transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_positive_and_finite() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(5000.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-10.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }
}

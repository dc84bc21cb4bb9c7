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
    categories::{
        dto::{CategoryQuery, CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
        repo::Category,
    },
    error::ApiError,
    models::TxnKind,
    state::AppState,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// Case-insensitive name equality with Unicode semantics, matching the
/// `lower(name)` uniqueness index. Renaming a category to another case of
/// its own name must not trip the duplicate check.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<CategoryQuery>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    // Unrecognized type values are ignored rather than rejected.
    let kind = q.kind.as_deref().and_then(TxnKind::parse);
    let categories = Category::list_visible(&state.db, user_id, kind).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = Category::find_visible(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Category name is required"));
    }

    if Category::name_taken(&state.db, user_id, name, payload.kind).await? {
        warn!(%user_id, name, "duplicate category name");
        return Err(ApiError::conflict("Category already exists"));
    }

    let color = payload.color.as_deref().unwrap_or("#6b7280");
    let icon = payload.icon.as_deref().unwrap_or("tag");

    let category = Category::create(&state.db, user_id, name, payload.kind, color, icon)
        .await
        .map_err(|e| match ApiError::from(e) {
            // Lost the race against a concurrent create; same outcome as the
            // pre-check above.
            ApiError::Conflict(_) => ApiError::conflict("Category already exists"),
            other => other,
        })?;

    info!(%user_id, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let current = Category::find_visible(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    if current.is_default {
        return Err(ApiError::forbidden("Default categories cannot be modified"));
    }

    let name = match payload.name {
        Some(n) => {
            let n = n.trim().to_string();
            if n.is_empty() {
                return Err(ApiError::bad_request("Category name is required"));
            }
            if !same_name(&n, &current.name)
                && Category::name_taken(&state.db, user_id, &n, current.kind).await?
            {
                return Err(ApiError::conflict("Category already exists"));
            }
            n
        }
        None => current.name.clone(),
    };
    let color = payload.color.unwrap_or(current.color);
    let icon = payload.icon.unwrap_or(current.icon);

    let updated = Category::update(&state.db, user_id, id, &name, &color, &icon)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    info!(%user_id, category_id = %id, "category updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let current = Category::find_visible(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    if current.is_default {
        return Err(ApiError::forbidden("Default categories cannot be deleted"));
    }

    let deleted = Category::delete(&state.db, user_id, id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Category not found"));
    }

    info!(%user_id, category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

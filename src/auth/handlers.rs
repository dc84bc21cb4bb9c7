use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, PublicUser,
            RefreshRequest, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
        },
        repo::{PasswordReset, User},
        services::{
            generate_reset_token, hash_password, hash_reset_token, is_valid_email,
            verify_password, AuthUser, JwtKeys, RESET_TOKEN_TTL,
        },
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(get_me).put(update_me).delete(delete_me),
        )
        .route("/users/me/password", put(change_password))
}

fn public(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

/// The unique index on email turns a lost race into a conflict; keep the
/// message identical to the pre-check's.
fn map_email_conflict(err: ApiError) -> ApiError {
    match err {
        ApiError::Conflict(_) => ApiError::conflict("Email already registered"),
        other => other,
    }
}

fn token_pair(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: public(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::bad_request("Password too short"));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.name, &payload.email, &hash)
        .await
        .map_err(|e| map_email_conflict(e.into()))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(token_pair(&state, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(token_pair(&state, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(token_pair(&state, &user)?))
}

/// Always answers with the same body so the endpoint cannot be used to probe
/// which emails are registered. The token itself goes out through the mail
/// collaborator; here it is only logged at debug level.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let token = generate_reset_token();
        let expires_at = time::OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
        PasswordReset::replace_for_user(&state.db, user.id, &hash_reset_token(&token), expires_at)
            .await?;
        info!(user_id = %user.id, "password reset requested");
        debug!(user_id = %user.id, token = %token, "password reset token issued");
    } else {
        warn!(email = %email, "password reset for unknown email");
    }

    Ok(Json(json!({
        "message": "If that email is registered, a reset link has been sent"
    })))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::bad_request("Password too short"));
    }

    let record = PasswordReset::consume(&state.db, &hash_reset_token(&payload.token))
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, record.user_id, &hash).await?;

    info!(user_id = %record.user_id, "password reset completed");
    Ok(Json(json!({ "message": "Password has been reset" })))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        error!(user_id = %user_id, "user not found");
        ApiError::unauthorized("User not found")
    })?;

    Ok(Json(public(&user)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let current = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or(current.name);
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or(current.email);

    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let user = User::update_profile(&state.db, user_id, &name, &email)
        .await
        .map_err(|e| map_email_conflict(e.into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(public(&user)))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::bad_request("Password too short"));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user_id, "change password with wrong current password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user_id, &hash).await?;

    info!(user_id = %user_id, "password changed");
    Ok(Json(json!({ "message": "Password updated" })))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    let deleted = User::delete(&state.db, user_id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user_id = %user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

// handlers/users.rs - /api/v1/users

use axum::extract::State;
use serde_json::Value;

use crate::api::format::{self, UserView};
use crate::api::{params, ApiJson, ApiPath};
use crate::auth;
use crate::database::models::UserParams;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

use super::ensure_same_user;

/// GET /api/v1/users/:user_id
pub async fn show(State(state): State<AppState>, ApiPath(user_id): ApiPath<i64>) -> ApiResult<UserView> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Couldn't find User"))?;

    let view = format::user_view(state.store.as_ref(), &user).await?;
    Ok(ApiResponse::ok("user", view))
}

/// POST /api/v1/users - sign up; the response carries the new auth token
pub async fn create(State(state): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult<UserView> {
    let user_params = params::require::<UserParams>(body, "user")?;

    let mut errors = user_params.validate(true);
    if let Some(email) = user_params.email() {
        if state.store.find_user_by_email(&email).await?.is_some() {
            errors.add("email", "has already been taken");
        }
    }
    errors.into_result()?;

    let token = auth::generate_unique_token(state.store.as_ref()).await?;
    let new_user = user_params.into_new(token, state.config.security.password_cost)?;
    let user = state.store.insert_user(new_user).await?;
    tracing::info!("Created user {}", user.id);

    let view = format::user_view(state.store.as_ref(), &user).await?.with_token(&user);
    Ok(ApiResponse::created("user", view))
}

/// PATCH|PUT /api/v1/users/:user_id - the current user edits their own account
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<UserView> {
    ensure_same_user(&current, user_id)?;
    let user_params = params::require::<UserParams>(body, "user")?;

    let mut errors = user_params.validate(false);
    if let Some(email) = user_params.email() {
        let holder = state.store.find_user_by_email(&email).await?;
        if holder.is_some_and(|u| u.id != current.id) {
            errors.add("email", "has already been taken");
        }
    }
    errors.into_result()?;

    let changes = user_params.into_changes(state.config.security.password_cost)?;
    let user = state.store.update_user(current.id, changes).await?;
    tracing::info!("Updated user {}", user.id);

    let view = format::user_view(state.store.as_ref(), &user).await?.with_token(&user);
    Ok(ApiResponse::ok("user", view))
}

/// DELETE /api/v1/users/:user_id - removes the account and its products
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<()> {
    ensure_same_user(&current, user_id)?;

    state.store.delete_user(current.id).await?;
    tracing::info!("Deleted user {}", current.id);

    Ok(ApiResponse::no_content())
}

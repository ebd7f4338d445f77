// handlers/sessions.rs - token issue and revocation

use axum::extract::State;
use serde_json::Value;

use crate::api::format::{self, UserView};
use crate::api::{params, ApiJson, ApiPath};
use crate::auth;
use crate::database::models::SessionParams;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const INVALID_LOGIN: &str = "Invalid email or password";

/// POST /api/v1/sessions - exchange email and password for a fresh auth token
pub async fn create(State(state): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult<UserView> {
    let session = params::require::<SessionParams>(body, "session")?;

    let user = match session.email() {
        Some(email) => state.store.find_user_by_email(&email).await?,
        None => None,
    };
    let password = session.password.as_deref().unwrap_or_default();
    let mut user = match user {
        Some(user) if auth::verify_password(password, &user.password_digest)? => user,
        _ => {
            tracing::warn!("Rejected login attempt");
            return Err(ApiError::invalid_credentials(INVALID_LOGIN));
        }
    };

    // Signing in rotates the token; older copies stop working
    let token = auth::generate_unique_token(state.store.as_ref()).await?;
    state.store.set_auth_token(user.id, &token).await?;
    user.auth_token = token;
    tracing::info!("User {} signed in", user.id);

    let view = format::user_view(state.store.as_ref(), &user).await?.with_token(&user);
    Ok(ApiResponse::ok("user", view))
}

/// DELETE /api/v1/sessions/:token - revoke a token; unknown tokens are a no-op
pub async fn destroy(State(state): State<AppState>, ApiPath(token): ApiPath<String>) -> ApiResult<()> {
    if let Some(user) = state.store.find_user_by_token(&token).await? {
        let replacement = auth::generate_unique_token(state.store.as_ref()).await?;
        state.store.set_auth_token(user.id, &replacement).await?;
        tracing::info!("User {} signed out", user.id);
    }

    Ok(ApiResponse::no_content())
}

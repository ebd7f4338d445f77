use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Marketplace API",
        "version": version,
        "endpoints": {
            "products": "/api/v1/products[/:id] (public)",
            "user_products": "/api/v1/users/:user_id/products[/:id] (token required)",
            "users": "/api/v1/users[/:user_id] (show/create public, update/destroy token required)",
            "sessions": "/api/v1/sessions[/:token] (public)",
            "health": "/health (public)",
        }
    }))
}

/// GET /health - liveness plus a store round trip
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.store.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
pub use crate::state::AppState;

/// Full application router: service endpoints plus the versioned API.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(product_routes())
        .merge(user_routes())
        .merge(session_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_current_user,
        ));

    let mut router = Router::new()
        .route("/", get(handlers::status::root))
        .route("/health", get(handlers::status::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }

    router.with_state(state)
}

fn product_routes() -> Router<AppState> {
    use handlers::products;

    Router::new()
        .route("/products", get(products::index))
        .route("/products/:id", get(products::show))
        .route("/users/:user_id/products", post(products::create))
        .route(
            "/users/:user_id/products/:id",
            axum::routing::patch(products::update)
                .put(products::update)
                .delete(products::destroy),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", post(users::create))
        .route(
            "/users/:user_id",
            get(users::show)
                .patch(users::update)
                .put(users::update)
                .delete(users::destroy),
        )
}

fn session_routes() -> Router<AppState> {
    use handlers::sessions;

    Router::new()
        .route("/sessions", post(sessions::create))
        .route("/sessions/:token", axum::routing::delete(sessions::destroy))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

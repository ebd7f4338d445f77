use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The user whose `auth_token` came with the request.
///
/// Using it as a handler argument makes the route require authentication:
/// requests without a matching token are rejected with 401 before the
/// handler body runs.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Resolves the `Authorization` header to a user and stores it in the request extensions.
/// Never rejects on its own; see [`CurrentUser`].
pub async fn resolve_current_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(request.headers()) {
        match state.store.find_user_by_token(&token).await? {
            Some(user) => {
                tracing::debug!("Authenticated request as user {}", user.id);
                request.extensions_mut().insert(CurrentUser(user));
            }
            None => tracing::warn!("Authorization token did not match any user"),
        }
    }

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// Raw token, or `Bearer <token>`. Blank values count as absent.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_raw_and_bearer_tokens() {
        assert_eq!(extract_token(&headers("abc123")).as_deref(), Some("abc123"));
        assert_eq!(extract_token(&headers("Bearer abc123")).as_deref(), Some("abc123"));
        assert_eq!(extract_token(&headers("bearer  abc123 ")).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_blank_header_is_no_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers("Bearer ")), None);
        assert_eq!(extract_token(&headers("   ")), None);
    }
}

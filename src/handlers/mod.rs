// handlers/mod.rs - resource controllers
//
// Read endpoints are public. Mutating endpoints take a `CurrentUser`
// argument, which turns a missing or unknown token into a 401.

pub mod products;
pub mod sessions;
pub mod status;
pub mod users;

use crate::database::models::User;
use crate::error::ApiError;

/// Nested `/users/:user_id/...` routes only act on behalf of the token holder.
pub(crate) fn ensure_same_user(current: &User, user_id: i64) -> Result<(), ApiError> {
    if current.id == user_id {
        Ok(())
    } else {
        tracing::warn!("User {} tried to act as user {}", current.id, user_id);
        Err(ApiError::forbidden("Not authorized to act for this user"))
    }
}

use bcrypt::BcryptError;
use uuid::Uuid;

use crate::database::{Store, StoreError};

/// Random opaque token, 32 lowercase hex characters.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generates tokens until one is not held by any user.
pub async fn generate_unique_token(store: &dyn Store) -> Result<String, StoreError> {
    loop {
        let token = generate_token();
        if store.find_user_by_token(&token).await?.is_none() {
            return Ok(token);
        }
        tracing::debug!("Generated auth token collided, retrying");
    }
}

/// bcrypt digest of `password`; `cost` is the work factor (4..=31).
pub fn digest_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, digest: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(password, digest)
}

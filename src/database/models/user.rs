use bcrypt::BcryptError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use super::ValidationErrors;
use crate::auth;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_digest: String,
    pub auth_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_digest: String,
    pub auth_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_digest: Option<String>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password_digest) = self.password_digest {
            user.password_digest = password_digest;
        }
    }
}

/// Permitted attributes of the `user` request root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserParams {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl UserParams {
    /// Lower-cased, trimmed email, `None` when blank.
    pub fn email(&self) -> Option<String> {
        normalize_email(self.email.as_deref())
    }

    /// Field errors for a new account (`creating`) or a partial update.
    /// Email uniqueness needs the store and is checked by the caller.
    pub fn validate(&self, creating: bool) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        match (self.email(), &self.email) {
            (Some(email), _) if !looks_like_email(&email) => errors.add("email", "is invalid"),
            (None, Some(_)) => errors.add("email", "can't be blank"),
            (None, None) if creating => errors.add("email", "can't be blank"),
            _ => {}
        }

        match self.password.as_deref() {
            None | Some("") if creating => errors.add("password", "can't be blank"),
            Some(password) if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LENGTH => {
                errors.add(
                    "password",
                    format!("is too short (minimum is {} characters)", MIN_PASSWORD_LENGTH),
                );
            }
            _ => {}
        }

        if let (Some(password), Some(confirmation)) = (&self.password, &self.password_confirmation) {
            if password != confirmation {
                errors.add("password_confirmation", "doesn't match Password");
            }
        }

        errors
    }

    /// Hashes the password with the given bcrypt `cost`.
    pub fn into_new(self, auth_token: String, cost: u32) -> Result<NewUser, BcryptError> {
        let password_digest = auth::digest_password(self.password.as_deref().unwrap_or_default(), cost)?;
        Ok(NewUser {
            email: self.email().unwrap_or_default(),
            password_digest,
            auth_token,
        })
    }

    /// A blank password leaves the stored digest alone.
    pub fn into_changes(self, cost: u32) -> Result<UserChanges, BcryptError> {
        let password_digest = match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(auth::digest_password(password, cost)?),
            None => None,
        };
        Ok(UserChanges {
            email: self.email(),
            password_digest,
        })
    }
}

/// Attributes of the `session` request root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionParams {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SessionParams {
    pub fn email(&self) -> Option<String> {
        normalize_email(self.email.as_deref())
    }
}

fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

// one '@', something on both sides, no whitespace
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

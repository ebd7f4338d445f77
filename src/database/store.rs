use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use super::models::{NewProduct, NewUser, Product, ProductChanges, User, UserChanges};
use super::search::{Page, PageRequest, ProductSearch};

/// Errors surfaced by any store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Couldn't find {0}")]
    NotFound(&'static str),

    /// A unique column already holds the value
    #[error("{0} has already been taken")]
    Conflict(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for users and their products.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, StoreError>;

    async fn set_auth_token(&self, id: i64, token: &str) -> Result<(), StoreError>;

    /// Removes the user and every product they own.
    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    /// Product ids per owner, ascending. Owners without products are absent.
    async fn product_ids_by_user(&self, user_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, StoreError>;

    async fn search_products(
        &self,
        search: &ProductSearch,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError>;

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<Product, StoreError>;

    async fn delete_product(&self, id: i64) -> Result<(), StoreError>;
}

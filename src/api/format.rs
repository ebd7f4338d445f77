use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::database::models::{Product, User};
use crate::database::{Store, StoreError};

/// Public representation of a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_ids: Vec<i64>,
    /// Only shown to the account holder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl UserView {
    pub fn new(user: &User, product_ids: Vec<i64>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            product_ids,
            auth_token: None,
        }
    }

    pub fn with_token(mut self, user: &User) -> Self {
        self.auth_token = Some(user.auth_token.clone());
        self
    }
}

/// Product with its owner embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub published: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<UserView>,
}

impl ProductView {
    pub fn new(product: &Product, user: Option<UserView>) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            published: product.published,
            user_id: product.user_id,
            created_at: product.created_at,
            updated_at: product.updated_at,
            user,
        }
    }
}

pub async fn user_view(store: &dyn Store, user: &User) -> Result<UserView, StoreError> {
    let mut ids = store.product_ids_by_user(&[user.id]).await?;
    Ok(UserView::new(user, ids.remove(&user.id).unwrap_or_default()))
}

pub async fn product_view(store: &dyn Store, product: &Product) -> Result<ProductView, StoreError> {
    let mut views = product_views(store, std::slice::from_ref(product)).await?;
    Ok(views.remove(0))
}

/// Renders products with owners loaded in two queries regardless of list length.
pub async fn product_views(store: &dyn Store, products: &[Product]) -> Result<Vec<ProductView>, StoreError> {
    let mut owner_ids: Vec<i64> = products.iter().map(|p| p.user_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let mut product_ids = store.product_ids_by_user(&owner_ids).await?;
    let owners: HashMap<i64, UserView> = store
        .find_users(&owner_ids)
        .await?
        .into_iter()
        .map(|u| {
            let ids = product_ids.remove(&u.id).unwrap_or_default();
            (u.id, UserView::new(&u, ids))
        })
        .collect();

    Ok(products
        .iter()
        .map(|p| ProductView::new(p, owners.get(&p.user_id).cloned()))
        .collect())
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::models::{NewProduct, NewUser, Product, ProductChanges, User, UserChanges};
use super::search::{Page, PageRequest, ProductSearch};
use super::store::{Store, StoreError};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    products: BTreeMap<i64, Product>,
    last_user_id: i64,
    last_product_id: i64,
}

impl Tables {
    fn taken(&self, except: Option<i64>, column: &'static str, value: &str) -> Option<StoreError> {
        let clash = self.users.values().any(|u| {
            Some(u.id) != except
                && match column {
                    "email" => u.email == value,
                    _ => u.auth_token == value,
                }
        });
        clash.then_some(StoreError::Conflict(column))
    }
}

/// Process-local `Store` used by tests and `--in-memory` runs. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.auth_token == token).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(err) = tables
            .taken(None, "email", &user.email)
            .or_else(|| tables.taken(None, "auth_token", &user.auth_token))
        {
            return Err(err);
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.last_user_id,
            email: user.email,
            password_digest: user.password_digest,
            auth_token: user.auth_token,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if let Some(err) = tables.taken(Some(id), "email", email) {
                return Err(err);
            }
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        changes.apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_auth_token(&self, id: i64, token: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(err) = tables.taken(Some(id), "auth_token", token) {
            return Err(err);
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.auth_token = token.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(StoreError::NotFound("User"))?;
        tables.products.retain(|_, p| p.user_id != id);
        Ok(())
    }

    async fn product_ids_by_user(&self, user_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, StoreError> {
        let tables = self.tables.read().await;
        let mut ids: HashMap<i64, Vec<i64>> = HashMap::new();
        // BTreeMap iteration keeps ids ascending
        for product in tables.products.values() {
            if user_ids.contains(&product.user_id) {
                ids.entry(product.user_id).or_default().push(product.id);
            }
        }
        Ok(ids)
    }

    async fn search_products(
        &self,
        search: &ProductSearch,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Product> = tables
            .products
            .values()
            .filter(|p| search.matches(p))
            .cloned()
            .collect();
        search.sort(&mut matching);

        let total_count = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(Page::new(items, page, total_count))
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&product.user_id) {
            return Err(StoreError::NotFound("User"));
        }

        tables.last_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: tables.last_product_id,
            title: product.title,
            price: product.price,
            published: product.published,
            user_id: product.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<Product, StoreError> {
        let mut tables = self.tables.write().await;
        let product = tables.products.get_mut(&id).ok_or(StoreError::NotFound("Product"))?;
        changes.apply(product);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.products.remove(&id).ok_or(StoreError::NotFound("Product"))?;
        Ok(())
    }
}

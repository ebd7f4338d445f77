use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

use super::manager::DatabaseManager;
use super::models::{NewProduct, NewUser, Product, ProductChanges, User, UserChanges};
use super::query_builder::{self, PRODUCT_COLUMNS, USER_COLUMNS};
use super::search::{Page, PageRequest, ProductSearch};
use super::store::{Store, StoreError};

/// `Store` backed by PostgreSQL through a shared `sqlx` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique violations on the users table to the offending column.
fn user_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(c) if c.contains("auth_token") => StoreError::Conflict("auth_token"),
                _ => StoreError::Conflict("email"),
            };
        }
    }
    StoreError::Sqlx(err)
}

/// A product pointing at a missing owner reports the owner as not found.
fn product_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound("User");
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1) ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE auth_token = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (email, password_digest, auth_token) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_digest)
            .bind(&user.auth_token)
            .fetch_one(&self.pool)
            .await
            .map_err(user_write_error)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let sql = format!(
            r#"UPDATE users
               SET email = COALESCE($2, email),
                   password_digest = COALESCE($3, password_digest),
                   updated_at = now()
               WHERE id = $1
               RETURNING {}"#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.password_digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(user_write_error)?
            .ok_or(StoreError::NotFound("User"))
    }

    async fn set_auth_token(&self, id: i64, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET auth_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(user_write_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        // products go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn product_ids_by_user(&self, user_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query("SELECT user_id, id FROM products WHERE user_id = ANY($1) ORDER BY id")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut ids: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            let user_id: i64 = row.try_get("user_id")?;
            let id: i64 = row.try_get("id")?;
            ids.entry(user_id).or_default().push(id);
        }
        Ok(ids)
    }

    async fn search_products(
        &self,
        search: &ProductSearch,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let total_count: i64 = query_builder::count_products(search)
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let items = query_builder::select_products(search, page)
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, total_count))
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products (title, price, published, user_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.title)
            .bind(product.price)
            .bind(product.published)
            .bind(product.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(product_write_error)
    }

    async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<Product, StoreError> {
        let sql = format!(
            r#"UPDATE products
               SET title = COALESCE($2, title),
                   price = COALESCE($3, price),
                   published = COALESCE($4, published),
                   updated_at = now()
               WHERE id = $1
               RETURNING {}"#,
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.price)
            .bind(changes.published)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("Product"))
    }

    async fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Product"));
        }
        Ok(())
    }
}

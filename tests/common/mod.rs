#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use marketplace_api::auth;
use marketplace_api::config::AppConfig;
use marketplace_api::database::models::{NewProduct, NewUser, Product, User};
use marketplace_api::database::{MemoryStore, Store};
use marketplace_api::{app, AppState};
use reqwest::{RequestBuilder, StatusCode};
use rust_decimal::Decimal;

pub const PASSWORD: &str = "12345678";

/// Lowest bcrypt cost, keeps sign-up and login fast under test
pub const PASSWORD_COST: u32 = 4;

static SEQUENCE: AtomicUsize = AtomicUsize::new(1);

fn next_sequence() -> usize {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// The application served in-process on a free port, backed by a fresh `MemoryStore`.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        config.security.password_cost = PASSWORD_COST;
        Self::start_with(config).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let port = serve(AppState::new(store.clone(), config)).await?;

        let server = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn api(&self, path: &str) -> String {
        self.url(&format!("/api/v1{}", path))
    }

    /// Persists a user the way sign-up would, with a known password.
    pub async fn create_user(&self) -> Result<User> {
        let n = next_sequence();
        let user = self
            .store
            .insert_user(NewUser {
                email: format!("user{}@example.com", n),
                password_digest: auth::digest_password(PASSWORD, PASSWORD_COST)?,
                auth_token: auth::generate_token(),
            })
            .await?;
        Ok(user)
    }

    pub async fn create_product(&self, user: &User) -> Result<Product> {
        let n = next_sequence();
        let product = self
            .store
            .insert_product(NewProduct {
                title: format!("Product {}", n),
                price: Decimal::new((n as i64 % 100) * 100 + 99, 2),
                published: false,
                user_id: user.id,
            })
            .await?;
        Ok(product)
    }

    pub async fn create_priced_product(&self, user: &User, title: &str, price: Decimal) -> Result<Product> {
        let product = self
            .store
            .insert_product(NewProduct {
                title: title.to_string(),
                price,
                published: true,
                user_id: user.id,
            })
            .await?;
        Ok(product)
    }
}

/// Serves `state` on a free local port in the background and returns the port.
pub async fn serve(state: AppState) -> Result<u16> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });
    Ok(port)
}

/// Adds the user's token the way API clients send it.
pub fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("Authorization", token)
}

// handlers/products.rs - /api/v1/products and /api/v1/users/:user_id/products

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::api::format::{self, ProductView};
use crate::api::{pagination, params, ApiJson, ApiPath, ApiQuery};
use crate::database::models::{Product, ProductParams, User};
use crate::database::{PageRequest, ProductSearch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

use super::ensure_same_user;

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// `product_ids=1,2`, `product_ids=1&product_ids=2` or `product_ids[]=1&product_ids[]=2`
    #[serde(default, alias = "product_ids[]")]
    pub product_ids: Vec<String>,
    pub keyword: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub recent: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl IndexQuery {
    pub fn search(&self) -> Result<ProductSearch, ApiError> {
        let product_ids = self
            .product_ids
            .iter()
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| ApiError::bad_request(format!("invalid product id: {}", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductSearch {
            product_ids: (!product_ids.is_empty()).then_some(product_ids),
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            min_price: price_bound("min_price", self.min_price.as_deref())?,
            max_price: price_bound("max_price", self.max_price.as_deref())?,
            recent: matches!(
                self.recent.as_deref().map(str::trim),
                Some(v) if !v.is_empty() && v != "false" && v != "0"
            ),
        })
    }
}

fn price_bound(name: &str, raw: Option<&str>) -> Result<Option<Decimal>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Decimal::from_str(s)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be a number", name))),
    }
}

/// GET /api/v1/products - paginated, filterable list with owners embedded
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IndexQuery>,
) -> ApiResult<Vec<ProductView>> {
    let search = query.search()?;
    let request = PageRequest::new(
        params::integer("page", query.page.as_deref())?,
        params::integer("per_page", query.per_page.as_deref())?,
        &state.config.api,
    );

    let page = state.store.search_products(&search, request).await?;
    let meta = pagination(&page, page.per_page);
    let products = format::product_views(state.store.as_ref(), &page.items).await?;

    Ok(ApiResponse::ok("products", products).with_meta(meta))
}

/// GET /api/v1/products/:id
pub async fn show(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<ProductView> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Couldn't find Product"))?;

    let view = format::product_view(state.store.as_ref(), &product).await?;
    Ok(ApiResponse::ok("product", view))
}

/// POST /api/v1/users/:user_id/products - builds the product for the current user
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<ProductView> {
    ensure_same_user(&user, user_id)?;

    let new_product = params::require::<ProductParams>(body, "product")?.into_new(user.id)?;
    let product = state.store.insert_product(new_product).await?;
    tracing::info!("User {} created product {}", user.id, product.id);

    let view = format::product_view(state.store.as_ref(), &product).await?;
    Ok(ApiResponse::created("product", view))
}

/// PATCH|PUT /api/v1/users/:user_id/products/:id - partial update of an owned product
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((user_id, id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<ProductView> {
    ensure_same_user(&user, user_id)?;
    let product = owned_product(&state, &user, id).await?;

    let changes = params::require::<ProductParams>(body, "product")?.into_changes(&product)?;
    let product = state.store.update_product(product.id, changes).await?;
    tracing::info!("User {} updated product {}", user.id, product.id);

    let view = format::product_view(state.store.as_ref(), &product).await?;
    Ok(ApiResponse::ok("product", view))
}

/// DELETE /api/v1/users/:user_id/products/:id
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((user_id, id)): ApiPath<(i64, i64)>,
) -> ApiResult<()> {
    ensure_same_user(&user, user_id)?;
    let product = owned_product(&state, &user, id).await?;

    state.store.delete_product(product.id).await?;
    tracing::info!("User {} deleted product {}", user.id, product.id);

    Ok(ApiResponse::no_content())
}

/// Someone else's product is reported exactly like a missing one.
async fn owned_product(state: &AppState, user: &User, id: i64) -> Result<Product, ApiError> {
    state
        .store
        .find_product(id)
        .await?
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| ApiError::not_found("Couldn't find Product"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(product_ids: Option<&str>, recent: Option<&str>) -> IndexQuery {
        IndexQuery {
            product_ids: product_ids.map(str::to_string).into_iter().collect(),
            recent: recent.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn parses_product_id_lists() {
        let search = query(Some("1, 2,,3"), None).search().unwrap();
        assert_eq!(search.product_ids, Some(vec![1, 2, 3]));

        assert_eq!(query(Some(" "), None).search().unwrap().product_ids, None);
        assert!(query(Some("1,x"), None).search().is_err());
    }

    #[test]
    fn merges_repeated_product_ids() {
        let q = IndexQuery {
            product_ids: vec!["4".to_string(), "5,6".to_string(), "".to_string()],
            ..Default::default()
        };
        assert_eq!(q.search().unwrap().product_ids, Some(vec![4, 5, 6]));
    }

    #[test]
    fn recent_flag_is_truthy_unless_false() {
        assert!(query(None, Some("true")).search().unwrap().recent);
        assert!(query(None, Some("1")).search().unwrap().recent);
        assert!(!query(None, Some("false")).search().unwrap().recent);
        assert!(!query(None, Some("")).search().unwrap().recent);
        assert!(!query(None, None).search().unwrap().recent);
    }

    #[test]
    fn price_bounds_must_be_numeric() {
        let q = IndexQuery {
            min_price: Some("10.5".to_string()),
            max_price: Some("cheap".to_string()),
            ..Default::default()
        };
        assert!(q.search().is_err());

        let q = IndexQuery {
            min_price: Some("10.5".to_string()),
            keyword: Some("  ".to_string()),
            ..Default::default()
        };
        let search = q.search().unwrap();
        assert_eq!(search.min_price, Some(Decimal::new(105, 1)));
        assert_eq!(search.keyword, None);
    }
}

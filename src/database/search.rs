use rust_decimal::Decimal;

use super::models::Product;
use crate::config::ApiConfig;

/// Product index filters. Every `Some` narrows the result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSearch {
    pub product_ids: Option<Vec<i64>>,
    /// Case-insensitive substring of the title
    pub keyword: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Newest `updated_at` first instead of ascending id
    pub recent: bool,
}

impl ProductSearch {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ids) = &self.product_ids {
            if !ids.contains(&product.id) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !product.title.to_lowercase().contains(&keyword.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }

    /// Orders matching products the way the SQL backend does.
    pub fn sort(&self, products: &mut [Product]) {
        if self.recent {
            products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        } else {
            products.sort_by_key(|p| p.id);
        }
    }
}

/// 1-based page number and page size, already clamped to the API limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>, api: &ApiConfig) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1).min(u32::MAX as i64) as u32;
        let per_page = per_page
            .filter(|p| *p >= 1)
            .map(|p| p.min(api.max_per_page as i64) as u32)
            .unwrap_or(api.default_per_page);

        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// One page of a result set plus the size of the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_count,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.total_count <= 0 || self.per_page == 0 {
            return 0;
        }
        let per_page = self.per_page as i64;
        (self.total_count + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::{Duration, Utc};

    fn product(id: i64, title: &str, price: i64, age_secs: i64) -> Product {
        let at = Utc::now() - Duration::seconds(age_secs);
        Product {
            id,
            title: title.to_string(),
            price: Decimal::new(price, 0),
            published: false,
            user_id: 1,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        let api = AppConfig::development().api;
        assert_eq!(PageRequest::new(None, None, &api), PageRequest { page: 1, per_page: 25 });
        assert_eq!(PageRequest::new(Some(0), Some(-4), &api), PageRequest { page: 1, per_page: 25 });
        assert_eq!(PageRequest::new(Some(3), Some(500), &api), PageRequest { page: 3, per_page: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(10), &api).offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest { page: 1, per_page: 2 };
        assert_eq!(Page::<()>::new(vec![], request, 0).total_pages(), 0);
        assert_eq!(Page::<()>::new(vec![], request, 4).total_pages(), 2);
        assert_eq!(Page::<()>::new(vec![], request, 5).total_pages(), 3);
    }

    #[test]
    fn search_filters_combine() {
        let search = ProductSearch {
            product_ids: Some(vec![1, 2]),
            keyword: Some("tv".to_string()),
            min_price: Some(Decimal::new(10, 0)),
            max_price: Some(Decimal::new(50, 0)),
            recent: false,
        };
        assert!(search.matches(&product(1, "Smart TV", 20, 0)));
        assert!(!search.matches(&product(3, "Smart TV", 20, 0)));
        assert!(!search.matches(&product(2, "Radio", 20, 0)));
        assert!(!search.matches(&product(2, "TV", 60, 0)));
        assert!(!search.matches(&product(2, "TV", 5, 0)));
    }

    #[test]
    fn recent_orders_by_updated_at_desc() {
        let mut products = vec![product(1, "a", 1, 30), product(2, "b", 1, 10), product(3, "c", 1, 20)];
        ProductSearch { recent: true, ..Default::default() }.sort(&mut products);
        assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        ProductSearch::default().sort(&mut products);
        assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}

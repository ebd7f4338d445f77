use sqlx::{Postgres, QueryBuilder};

use super::search::{PageRequest, ProductSearch};

pub const PRODUCT_COLUMNS: &str = "id, title, price, published, user_id, created_at, updated_at";
pub const USER_COLUMNS: &str = "id, email, password_digest, auth_token, created_at, updated_at";

/// One page of products matching `search`, in index order.
pub fn select_products(search: &ProductSearch, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
    push_conditions(&mut qb, search);

    if search.recent {
        qb.push(" ORDER BY updated_at DESC, id DESC");
    } else {
        qb.push(" ORDER BY id ASC");
    }

    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

/// Total number of products matching `search`, ignoring paging.
pub fn count_products(search: &ProductSearch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_conditions(&mut qb, search);
    qb
}

fn push_conditions(qb: &mut QueryBuilder<'static, Postgres>, search: &ProductSearch) {
    let mut separator = " WHERE ";

    if let Some(ids) = &search.product_ids {
        qb.push(separator).push("id = ANY(").push_bind(ids.clone()).push(")");
        separator = " AND ";
    }
    if let Some(keyword) = &search.keyword {
        qb.push(separator)
            .push("title ILIKE ")
            .push_bind(format!("%{}%", escape_like(keyword)));
        separator = " AND ";
    }
    if let Some(min) = search.min_price {
        qb.push(separator).push("price >= ").push_bind(min);
        separator = " AND ";
    }
    if let Some(max) = search.max_price {
        qb.push(separator).push("price <= ").push_bind(max);
    }
}

// Postgres LIKE uses backslash as the default escape
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const FIRST_PAGE: PageRequest = PageRequest { page: 1, per_page: 25 };

    #[test]
    fn unfiltered_select_orders_by_id() {
        let qb = select_products(&ProductSearch::default(), FIRST_PAGE);
        assert_eq!(
            qb.sql(),
            "SELECT id, title, price, published, user_id, created_at, updated_at FROM products ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn filters_are_joined_with_and() {
        let search = ProductSearch {
            product_ids: Some(vec![1, 2, 3]),
            keyword: Some("tv".to_string()),
            min_price: Some(Decimal::new(10, 0)),
            max_price: Some(Decimal::new(90, 0)),
            recent: true,
        };
        let qb = select_products(&search, FIRST_PAGE);
        assert!(qb.sql().contains(
            "WHERE id = ANY($1) AND title ILIKE $2 AND price >= $3 AND price <= $4 ORDER BY updated_at DESC, id DESC LIMIT $5 OFFSET $6"
        ));
    }

    #[test]
    fn count_shares_conditions_without_paging() {
        let search = ProductSearch {
            max_price: Some(Decimal::new(5, 0)),
            ..Default::default()
        };
        assert_eq!(count_products(&search).sql(), "SELECT COUNT(*) FROM products WHERE price <= $1");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}

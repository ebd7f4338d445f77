use serde::Serialize;
use serde_json::{json, Value};

use crate::database::Page;

/// Page metadata reported next to a paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub per_page: i64,
    pub total_pages: i64,
    pub total_objects: i64,
}

impl PaginationMeta {
    pub fn new<T>(page: &Page<T>, per_page: impl Into<i64>) -> Self {
        Self {
            per_page: per_page.into(),
            total_pages: page.total_pages(),
            total_objects: page.total_count,
        }
    }
}

/// `{ "pagination": { per_page, total_pages, total_objects } }` for a result page.
pub fn pagination<T>(page: &Page<T>, per_page: impl Into<i64>) -> Value {
    json!({ "pagination": PaginationMeta::new(page, per_page) })
}

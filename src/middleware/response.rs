use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// JSON response rendered under a root key, e.g. `{"product": {...}}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub root: &'static str,
    pub data: T,
    /// Extra top-level keys merged next to the root (pagination)
    pub meta: Option<Value>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn ok(root: &'static str, data: T) -> Self {
        Self::with_status(root, data, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(root: &'static str, data: T) -> Self {
        Self::with_status(root, data, StatusCode::CREATED)
    }

    pub fn with_status(root: &'static str, data: T, status_code: StatusCode) -> Self {
        Self {
            root,
            data,
            meta: None,
            status_code,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    /// 204 No Content (empty body)
    pub fn no_content() -> Self {
        Self::with_status("", (), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status_code == StatusCode::NO_CONTENT {
            return self.status_code.into_response();
        }

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "errors": "Failed to serialize response data" })),
                )
                    .into_response();
            }
        };

        let mut body = Map::new();
        body.insert(self.root.to_string(), data_value);
        if let Some(Value::Object(meta)) = self.meta {
            body.extend(meta);
        }

        (self.status_code, Json(Value::Object(body))).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

pub mod auth;
pub mod response;

pub use auth::{resolve_current_user, CurrentUser};
pub use response::{ApiResponse, ApiResult};

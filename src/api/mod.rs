pub mod extract;
pub mod format;
pub mod pagination;
pub mod params;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use pagination::pagination;

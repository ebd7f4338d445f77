pub mod errors;
pub mod product;
pub mod user;

pub use errors::ValidationErrors;
pub use product::{NewProduct, Product, ProductChanges, ProductParams};
pub use user::{NewUser, SessionParams, User, UserChanges, UserParams};

pub mod error;
pub mod handlers;
pub mod menu;
pub mod models;
pub mod repository;
pub mod service;

pub use error::*;
pub use handlers::*;
pub use menu::{parse_price, MenuResolver, ResolvedMenuItem};
pub use models::*;
pub use repository::*;
pub use service::*;

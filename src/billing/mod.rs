pub mod day_type;
pub mod error;
pub mod handlers;
pub mod models;
pub mod price_table;
pub mod printer;
pub mod repository;
pub mod service;
pub mod session;

pub use day_type::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use printer::{render_bill, LogPrinter, PrintJob, PrintQueue, PrintTransport};
pub use repository::*;
pub use service::*;

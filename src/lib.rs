pub mod analytics;
pub mod cli;
pub mod csv_io;
pub mod db;
pub mod errors;
pub mod models;
pub mod seed;

pub use analytics::FunnelAnalytics;
pub use db::Database;
pub use errors::{AppError, AppResult};

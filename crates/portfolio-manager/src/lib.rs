pub mod db;
pub mod error;
pub mod models;
pub mod portfolio;
pub mod valuation;

pub use db::PortfolioDb;
pub use error::PortfolioError;
pub use models::*;
pub use portfolio::PortfolioManager;
pub use valuation::{summarize, value_holding};

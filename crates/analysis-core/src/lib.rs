pub mod cache;
pub mod error;
pub mod types;

pub use cache::TtlCache;
pub use error::*;
pub use types::*;

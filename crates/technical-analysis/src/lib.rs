pub mod indicators;
pub mod recommendation;


pub use indicators::*;
pub use recommendation::*;

pub mod error;
pub mod schemas;
pub mod types;

pub use error::*;
pub use schemas::*;
pub use types::*;

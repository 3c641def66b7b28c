pub mod features;
pub mod merge;

pub use features::derive_price_features;
pub use merge::{floor_to_hour, merge_news_price};

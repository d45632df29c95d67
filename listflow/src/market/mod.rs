//! Target-market helpers: search launching and product price extraction.

mod price;
mod search;

pub use price::{extract_target_price, TargetPrice};
pub use search::{
    build_search_url, LaunchChannel, MarketSearch, SearchHistory, SearchLaunch, SearchOptions,
};

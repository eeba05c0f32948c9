pub mod scrape;
pub mod search;

pub use scrape::{HttpFetcher, PageFetcher, PageScraper};
pub use search::{GoogleSearchClient, SearchProvider};

pub mod fixture;
pub mod scraper;

pub use fixture::FixtureFetcher;
pub use scraper::ScraperFetcher;

//! External feed fetching.

pub mod fetcher;

pub use fetcher::{HttpFeedFetcher, HttpFeedFetcherBuilder};

pub mod decode;
pub mod fetch;
pub mod fragment;
pub mod resolve;

pub use fetch::{DocumentFetcher, FetchedDocument, HttpFetcher, ScraperOptions, DEFAULT_USER_AGENT};

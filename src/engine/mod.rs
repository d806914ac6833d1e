pub mod scan;
pub mod session;

pub use session::{Document, ScrapeBuilder, Scraper, DEFAULT_MAX_REDIRECTS};

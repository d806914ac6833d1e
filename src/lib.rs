//! Link previews from a single streaming pass over a page.
//!
//! Fetch → Decode → Tokenize → Scan (→ re-fetch on canonical / fragment
//! redirects) → [`Preview`].

pub mod dom;
pub mod engine;
pub mod error;
pub mod net;
pub mod preview;
#[cfg(test)]
mod test_support;

pub use engine::{Document, ScrapeBuilder, Scraper, DEFAULT_MAX_REDIRECTS};
pub use error::{Result, ScrapeError};
pub use net::{DocumentFetcher, ScraperOptions, DEFAULT_USER_AGENT};
pub use preview::Preview;

/// Scrape `url`, following at most `max_redirects` canonical-link or
/// escaped-fragment redirects found inside the pages.
pub fn scrape(url: &str, max_redirects: u32, options: ScraperOptions) -> Result<Preview> {
    let document = Scraper::new(url, max_redirects, &options)?.scrape()?;
    Ok(document.preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ok, request_path, serve};
    use std::time::Duration;

    fn page(body: &str) -> Vec<u8> {
        ok(
            &format!("Content-Type: text/html\r\nContent-Length: {}\r\n", body.len()),
            body,
        )
    }

    fn options() -> ScraperOptions {
        ScraperOptions {
            timeout: Duration::from_secs(5),
            ..ScraperOptions::default()
        }
    }

    #[test]
    fn scrapes_over_http_following_canonical() {
        let base = serve(2, |head| match request_path(head) {
            "/amp" => page(r#"<head><link rel="canonical" href="/story"></head>"#),
            _ => page(
                r#"<head><title>Story</title><meta name="description" content="Long read"></head>
                <body><img src="/lead.jpg"></body>"#,
            ),
        });

        let preview = scrape(&format!("{}/amp", base), 1, options()).unwrap();

        assert_eq!(preview.title, "Story");
        assert_eq!(preview.description, "Long read");
        assert_eq!(preview.link, format!("{}/story", base));
        assert_eq!(preview.images, vec![format!("{}/lead.jpg", base)]);
    }

    #[test]
    fn oversized_response_yields_no_preview() {
        let base = serve(1, |_| page(&"x".repeat(4096)));

        let result = scrape(
            &base,
            0,
            ScraperOptions {
                max_body_bytes: Some(1024),
                ..options()
            },
        );

        assert!(matches!(
            result,
            Err(ScrapeError::SizeLimitExceeded { limit: 1024 })
        ));
    }

    #[test]
    fn rejects_unparsable_url() {
        assert!(matches!(
            scrape("http://[::1", 0, options()),
            Err(ScrapeError::UrlParse { .. })
        ));
    }
}

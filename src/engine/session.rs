use std::time::Duration;

use url::Url;

use crate::dom::HtmlTokenizer;
use crate::engine::scan::{MetaScanner, Redirect, ScanOutcome};
use crate::error::{Result, ScrapeError};
use crate::net::decode::decode_to_utf8;
use crate::net::fetch::{DocumentFetcher, HttpFetcher, ScraperOptions};
use crate::net::fragment::{to_escaped_fragment_url, ESCAPED_FRAGMENT, HASH_BANG};
use crate::preview::Preview;

/// In-document redirects (canonical links, fragment markers) followed when
/// the caller does not say otherwise.
pub const DEFAULT_MAX_REDIRECTS: u32 = 3;

/// A fetched page and what was extracted from it.
#[derive(Debug, Clone)]
pub struct Document {
    /// Body decoded to UTF-8.
    pub body: String,
    pub content_type: String,
    pub preview: Preview,
}

/// One scrape session: owns the current URL, the escaped-fragment override
/// and the remaining redirect budget.
pub struct Scraper<F = HttpFetcher> {
    url: Url,
    escaped_fragment_url: Option<Url>,
    max_redirect: u32,
    fetcher: F,
}

impl Scraper<HttpFetcher> {
    pub fn new(url: &str, max_redirect: u32, options: &ScraperOptions) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| ScrapeError::url_parse(url, e))?;
        Ok(Self::with_fetcher(url, max_redirect, HttpFetcher::new(options)?))
    }
}

impl<F: DocumentFetcher> Scraper<F> {
    pub fn with_fetcher(url: Url, max_redirect: u32, fetcher: F) -> Self {
        Self {
            url,
            escaped_fragment_url: None,
            max_redirect,
            fetcher,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn escaped_fragment_url(&self) -> Option<&Url> {
        self.escaped_fragment_url.as_ref()
    }

    pub fn remaining_redirects(&self) -> u32 {
        self.max_redirect
    }

    /// Fetch, scan and follow in-document redirects until a preview is ready.
    pub fn scrape(mut self) -> Result<Document> {
        let doc = self.get_document()?;
        self.parse_document(doc)
    }

    /// Fetch the current URL (or its escaped-fragment form) and seed a
    /// preview for it. Does not touch the redirect budget.
    pub fn get_document(&mut self) -> Result<Document> {
        if self.url.as_str().contains(HASH_BANG) {
            self.escaped_fragment_url = Some(to_escaped_fragment_url(&self.url)?);
        }
        if self.url.as_str().contains(ESCAPED_FRAGMENT) {
            self.escaped_fragment_url = Some(self.url.clone());
        }

        let requested = self.request_url().clone();
        let fetched = self.fetcher.fetch(&requested)?;

        // The transport followed HTTP redirects: its answer is the truth now.
        if fetched.url != requested {
            log::debug!("{} resolved to {}", requested, fetched.url);
            self.escaped_fragment_url = None;
            self.url = fetched.url;
        }

        Ok(Document {
            body: decode_to_utf8(&fetched.body, &fetched.content_type),
            content_type: fetched.content_type,
            preview: Preview::seeded(&self.url),
        })
    }

    /// Scan `doc`, re-fetching and rescanning for every redirect signal the
    /// budget allows.
    pub fn parse_document(&mut self, mut doc: Document) -> Result<Document> {
        loop {
            let link = std::mem::take(&mut doc.preview.link);
            doc.preview = Preview {
                link,
                ..Preview::seeded(&self.url)
            };

            let scanner = MetaScanner::new(
                &self.url,
                doc.preview.link.clone(),
                self.escaped_fragment_url.is_some(),
                self.max_redirect > 0,
            );
            match scanner.run(HtmlTokenizer::new(&doc.body), &mut doc.preview)? {
                ScanOutcome::Redirect(redirect) => {
                    self.follow(redirect)?;
                    doc = self.get_document()?;
                }
                ScanOutcome::StoppedEarly => {
                    log::debug!("Preview of {} complete before end of document", self.url);
                    return Ok(doc);
                }
                ScanOutcome::Exhausted => return Ok(doc),
            }
        }
    }

    fn follow(&mut self, redirect: Redirect) -> Result<()> {
        self.max_redirect = self.max_redirect.saturating_sub(1);
        match redirect {
            Redirect::Canonical(target) => {
                log::debug!("Following canonical link {} -> {}", self.url, target);
                self.url = target;
                self.escaped_fragment_url = None;
            }
            Redirect::Fragment => {
                let escaped = to_escaped_fragment_url(&self.url)?;
                log::debug!("Following fragment marker {} -> {}", self.url, escaped);
                self.escaped_fragment_url = Some(escaped);
            }
        }
        Ok(())
    }

    fn request_url(&self) -> &Url {
        self.escaped_fragment_url.as_ref().unwrap_or(&self.url)
    }
}

/// Fluent construction of an HTTP-backed [`Scraper`].
#[derive(Debug, Clone)]
pub struct ScrapeBuilder {
    url: String,
    max_redirects: u32,
    options: ScraperOptions,
}

impl ScrapeBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            options: ScraperOptions::default(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// Zero disables the limit.
    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.options.max_body_bytes = (limit > 0).then_some(limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn options(&self) -> &ScraperOptions {
        &self.options
    }

    pub fn build(self) -> Result<Scraper<HttpFetcher>> {
        Scraper::new(&self.url, self.max_redirects, &self.options)
    }
}

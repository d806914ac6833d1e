use std::io::Read;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use url::Url;

use crate::error::{Result, ScrapeError};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; pagepeek/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Raw result of fetching one URL.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub body: Vec<u8>,
    /// URL that produced `body`, after transport-level redirects.
    pub url: Url,
    pub content_type: String,
}

/// Transport settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct ScraperOptions {
    pub user_agent: String,
    pub timeout: Duration,
    /// `None` disables both the HEAD probe and the streaming cap.
    pub max_body_bytes: Option<u64>,
    /// HTTP 3xx hops followed by the transport itself.
    pub max_transport_redirects: usize,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(15),
            max_body_bytes: None,
            max_transport_redirects: 10,
        }
    }
}

/// Where a scrape session gets its bytes from.
pub trait DocumentFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedDocument>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    user_agent: String,
    max_body_bytes: Option<u64>,
}

impl HttpFetcher {
    pub fn new(options: &ScraperOptions) -> Result<Self> {
        let user_agent = if options.user_agent.trim().is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            options.user_agent.clone()
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::limited(
                options.max_transport_redirects,
            ))
            .build()
            .map_err(|e| ScrapeError::Transport(format!("Client error: {}", e)))?;

        Ok(Self {
            client,
            user_agent,
            max_body_bytes: options.max_body_bytes.filter(|limit| *limit > 0),
        })
    }

    /// HEAD the URL and reject it early if it declares a body over `limit`.
    /// A failed probe is not fatal; the GET still enforces the cap.
    fn probe_length(&self, url: &Url, limit: u64) -> Result<()> {
        let response = match self
            .client
            .head(url.as_str())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("HEAD probe failed for {}: {}", url, e);
                return Ok(());
            }
        };

        match declared_length(response.headers()) {
            Some(length) if length > limit => Err(ScrapeError::SizeLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        if let Some(limit) = self.max_body_bytes {
            self.probe_length(url, limit)?;
        }

        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.as_str())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("{} answered {}, scanning body anyway", url, status);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        let final_url = response.url().clone();

        let body = match self.max_body_bytes {
            Some(limit) => {
                if matches!(declared_length(response.headers()), Some(length) if length > limit) {
                    return Err(ScrapeError::SizeLimitExceeded { limit });
                }
                let mut body = Vec::new();
                response.take(limit.saturating_add(1)).read_to_end(&mut body)?;
                if body.len() as u64 > limit {
                    return Err(ScrapeError::SizeLimitExceeded { limit });
                }
                body
            }
            None => response.bytes()?.to_vec(),
        };

        Ok(FetchedDocument {
            body,
            url: final_url,
            content_type,
        })
    }
}

fn declared_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

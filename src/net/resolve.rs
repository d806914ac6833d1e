//! Root-relative URL resolution for `src`/`href` values found in a page.
//!
//! References are joined against the page origin only. Path-relative
//! references (`img/a.png`, `../a.png`) are treated as if they were written
//! against `/`, which is all link previews need in practice.

use url::Url;

use crate::error::{Result, ScrapeError};

/// Host of `url` including a non-default port, e.g. `example.com:8080`.
pub fn host_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// `scheme://host[:port]` of `url`, without a trailing slash.
pub fn origin_of(url: &Url) -> String {
    format!("{}://{}", url.scheme(), host_of(url))
}

/// Resolve `candidate` against the origin of `base`.
///
/// Surrounding whitespace is trimmed first; after that, absolute URLs are
/// returned exactly as written. Scheme-relative references
/// (`//cdn.example/x.png`) borrow the base scheme.
pub fn resolve(base: &Url, candidate: &str) -> Result<String> {
    let candidate = candidate.trim();

    match Url::parse(candidate) {
        Ok(_) => return Ok(candidate.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(e) => return Err(ScrapeError::url_parse(candidate, e)),
    }

    let joined = if candidate.starts_with("//") {
        format!("{}:{}", base.scheme(), candidate)
    } else if candidate.starts_with('/') {
        format!("{}{}", origin_of(base), candidate)
    } else {
        format!("{}/{}", origin_of(base), candidate)
    };

    Url::parse(&joined)
        .map(String::from)
        .map_err(|e| ScrapeError::url_parse(candidate, e))
}

/// Like [`resolve`], but hands back the parsed URL.
pub fn resolve_url(base: &Url, candidate: &str) -> Result<Url> {
    let resolved = resolve(base, candidate)?;
    Url::parse(&resolved).map_err(|e| ScrapeError::url_parse(&resolved, e))
}

//! AJAX-crawlable `#!` URLs and their `_escaped_fragment_` equivalents.
//!
//! `https://ex.com/#!/page/1` is served to crawlers as
//! `https://ex.com/?_escaped_fragment_=/page/1`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

use crate::error::{Result, ScrapeError};

/// Query parameter prefix carrying the escaped fragment.
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_=";

/// Marker of an AJAX-crawlable fragment.
pub const HASH_BANG: &str = "#!";

/// Rewrite `url` into its escaped-fragment form.
///
/// Without a `#!` in the URL the marker is appended with an empty payload.
/// The marker is never deduplicated.
pub fn to_escaped_fragment_url(url: &Url) -> Result<Url> {
    let unescaped = query_unescape(url.as_str())?;
    let separator = if url.query_pairs().next().is_some() {
        '&'
    } else {
        '?'
    };

    let rewritten = match unescaped.find(HASH_BANG) {
        Some(at) => format!(
            "{}{}{}",
            &unescaped[..at],
            separator,
            escape_payload(&unescaped[at + HASH_BANG.len()..])
        ),
        None => format!("{}{}{}", unescaped, separator, ESCAPED_FRAGMENT),
    };

    Url::parse(&rewritten).map_err(|e| ScrapeError::url_parse(&rewritten, e))
}

/// `_escaped_fragment_=` followed by `payload`: control characters dropped,
/// space, `#`, `%`, `&`, `+` and non-ASCII percent-encoded.
fn escape_payload(payload: &str) -> String {
    let mut token = String::from(ESCAPED_FRAGMENT);
    for ch in payload.chars() {
        let code = ch as u32;
        if code < 32 || code == 127 {
            continue;
        }
        if code >= 127 || matches!(ch, ' ' | '#' | '%' | '&' | '+') {
            let mut buf = [0u8; 4];
            token.extend(utf8_percent_encode(ch.encode_utf8(&mut buf), NON_ALPHANUMERIC));
        } else {
            token.push(ch);
        }
    }
    token
}

/// Form-style unescape of a whole URL: `+` becomes a space, `%XX` is decoded.
/// Stray `%` signs and non-UTF-8 results are errors.
fn query_unescape(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    for (at, _) in input.match_indices('%') {
        let hex = bytes.get(at + 1..at + 3);
        if !matches!(hex, Some(h) if h.iter().all(u8::is_ascii_hexdigit)) {
            return Err(ScrapeError::UrlDecode(input.to_string()));
        }
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ScrapeError::UrlDecode(input.to_string()))
}

//! Byte-to-UTF-8 decoding of fetched documents.

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// How far into the body a `<meta charset>` declaration is looked for.
const PRESCAN_LEN: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// The `charset` parameter of a Content-Type header value, if any.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Pick the encoding of `body`: BOM, then the declared charset, then an
/// early `<meta charset>`, then UTF-8.
pub fn sniff_encoding(body: &[u8], content_type: &str) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) =
        charset_from_content_type(content_type).and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    let head = &body[..body.len().min(PRESCAN_LEN)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        // A page cannot declare itself UTF-16 from inside its own ASCII bytes.
        .map(|encoding| encoding.output_encoding())
        .unwrap_or(UTF_8)
}

/// Decode `body` to UTF-8. Malformed sequences become U+FFFD.
pub fn decode_to_utf8(body: &[u8], content_type: &str) -> String {
    let encoding = sniff_encoding(body, content_type);
    let (text, used, malformed) = encoding.decode(body);
    if malformed {
        log::debug!("Replaced malformed {} sequences while decoding", used.name());
    }
    text.into_owned()
}

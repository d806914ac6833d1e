//! One forward pass over the tokens of a single document.
//!
//! The scanner fills in a [`Preview`] and, after every token, decides whether
//! the session should keep reading, stop early, or throw the document away
//! and re-fetch a canonical or escaped-fragment URL.

use url::Url;

use crate::dom::{Token, TokenKind};
use crate::error::Result;
use crate::net::resolve::{resolve, resolve_url};
use crate::preview::Preview;

/// Decision taken after each token, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CanonicalRedirect(Url),
    FragmentRedirect,
    EarlyStop,
    Continue,
}

/// Why the document was given up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Canonical(Url),
    Fragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Title, description and og:image were all found after `</head>`.
    StoppedEarly,
    /// Ran out of tokens.
    Exhausted,
    Redirect(Redirect),
}

pub struct MetaScanner<'a> {
    base: &'a Url,
    fetched_link: String,
    fragment_url_set: bool,
    can_redirect: bool,

    head_passed: bool,
    og_image: bool,
    title_next: bool,
    canonical: Option<Url>,
    fragment: bool,
}

impl<'a> MetaScanner<'a> {
    /// `base` is the session URL relative references resolve against and
    /// `fetched_link` the link the document was fetched under.
    /// `fragment_url_set` suppresses the AJAX-crawlable meta marker;
    /// `can_redirect` is false once the redirect budget is spent.
    pub fn new(
        base: &'a Url,
        fetched_link: impl Into<String>,
        fragment_url_set: bool,
        can_redirect: bool,
    ) -> Self {
        Self {
            base,
            fetched_link: fetched_link.into(),
            fragment_url_set,
            can_redirect,
            head_passed: false,
            og_image: false,
            title_next: false,
            canonical: None,
            fragment: false,
        }
    }

    pub fn run<I>(mut self, tokens: I, preview: &mut Preview) -> Result<ScanOutcome>
    where
        I: IntoIterator<Item = Token>,
    {
        preview.images.clear();
        for token in tokens {
            match self.feed(&token, preview)? {
                Step::Continue => {}
                Step::EarlyStop => return Ok(ScanOutcome::StoppedEarly),
                Step::CanonicalRedirect(target) => {
                    return Ok(ScanOutcome::Redirect(Redirect::Canonical(target)))
                }
                Step::FragmentRedirect => return Ok(ScanOutcome::Redirect(Redirect::Fragment)),
            }
        }
        Ok(ScanOutcome::Exhausted)
    }

    /// Apply one token to `preview` and decide what happens next.
    pub fn feed(&mut self, token: &Token, preview: &mut Preview) -> Result<Step> {
        self.observe(token, preview)?;
        Ok(self.decide(preview))
    }

    fn observe(&mut self, token: &Token, preview: &mut Preview) -> Result<()> {
        let title_next = std::mem::take(&mut self.title_next);

        match token.kind {
            TokenKind::Text => {
                if title_next && preview.title.is_empty() {
                    preview.title = token.text.trim().to_string();
                }
                return Ok(());
            }
            TokenKind::Comment => return Ok(()),
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::SelfClosingTag => {}
        }

        let opening = token.kind != TokenKind::EndTag;
        match token.name.as_str() {
            "head" if !opening => self.head_passed = true,
            "body" => self.head_passed = true,
            "title" => self.title_next = token.kind == TokenKind::StartTag,
            "link" if opening => self.on_link(token, preview)?,
            "meta" if opening => self.on_meta(token, preview)?,
            "img" if opening => self.on_img(token, preview)?,
            _ => {}
        }
        Ok(())
    }

    fn decide(&self, preview: &Preview) -> Step {
        if self.head_passed && self.can_redirect {
            if let Some(target) = &self.canonical {
                return Step::CanonicalRedirect(target.clone());
            }
            if self.fragment {
                return Step::FragmentRedirect;
            }
        }
        if self.head_passed && self.og_image && preview.has_title_and_description() {
            return Step::EarlyStop;
        }
        Step::Continue
    }

    fn on_link(&mut self, token: &Token, preview: &mut Preview) -> Result<()> {
        let mut rel = String::new();
        let mut href = "";
        for (key, value) in &token.attrs {
            match clean(key).as_str() {
                "rel" => rel = clean(value),
                "href" => href = value.as_str(),
                _ => {}
            }
        }
        if href.trim().is_empty() {
            return Ok(());
        }

        if rel.contains("icon") {
            preview.icon = resolve(self.base, href)?;
        }
        if rel == "canonical" {
            let target = resolve_url(self.base, href)?;
            if target.as_str() != self.fetched_link {
                self.canonical = Some(target);
            }
        }
        Ok(())
    }

    fn on_meta(&mut self, token: &Token, preview: &mut Preview) -> Result<()> {
        // Two attributes only: skips <meta charset> and friends.
        if token.attrs.len() != 2 {
            return Ok(());
        }

        let mut name = "";
        let mut property = "";
        let mut content = "";
        for (key, value) in &token.attrs {
            match clean(key).as_str() {
                "name" => {
                    name = value.as_str();
                    property = value.as_str();
                }
                "property" => property = value.as_str(),
                "content" => content = value.as_str(),
                _ => {}
            }
        }

        if name == "fragment" && content == "!" && !self.fragment_url_set {
            self.fragment = true;
        }

        match clean(property).as_str() {
            "og:site_name" => preview.name = content.to_string(),
            "og:title" => {
                if preview.title.is_empty() {
                    preview.title = content.to_string();
                }
            }
            "og:type" => preview.kind = content.to_string(),
            "og:description" => preview.description = content.to_string(),
            "description" => {
                if preview.description.is_empty() {
                    preview.description = content.to_string();
                }
            }
            "og:url" => preview.link = content.to_string(),
            "og:image" if !content.trim().is_empty() => {
                preview.images = vec![resolve(self.base, content)?];
                self.og_image = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_img(&mut self, token: &Token, preview: &mut Preview) -> Result<()> {
        if self.og_image {
            return Ok(());
        }
        for (key, value) in &token.attrs {
            if clean(key) == "src" && !value.trim().is_empty() {
                preview.images.push(resolve(self.base, value)?);
            }
        }
        Ok(())
    }
}

fn clean(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlTokenizer;
    use crate::error::ScrapeError;

    const PAGE: &str = "https://ex.com/p";

    fn base() -> Url {
        Url::parse(PAGE).unwrap()
    }

    fn scan_with(html: &str, fragment_url_set: bool, can_redirect: bool) -> (Result<ScanOutcome>, Preview) {
        let base = base();
        let mut preview = Preview::seeded(&base);
        let outcome = MetaScanner::new(&base, PAGE, fragment_url_set, can_redirect)
            .run(HtmlTokenizer::new(html), &mut preview);
        (outcome, preview)
    }

    fn scan(html: &str) -> (ScanOutcome, Preview) {
        let (outcome, preview) = scan_with(html, false, true);
        (outcome.unwrap(), preview)
    }

    #[test]
    fn stops_once_og_fields_and_head_are_done() {
        let html = r#"<html><head>
            <meta property="og:title" content="T">
            <meta property="og:description" content="D">
            <meta property="og:image" content="I">
            </head><body><link rel="icon" href="/late.ico"><img src="/x.png"></body></html>"#;
        let (outcome, preview) = scan(html);
        assert_eq!(outcome, ScanOutcome::StoppedEarly);
        assert_eq!(preview.title, "T");
        assert_eq!(preview.description, "D");
        assert_eq!(preview.images, vec!["https://ex.com/I"]);
        // Nothing after </head> was applied.
        assert_eq!(preview.icon, "https://ex.com/favicon.ico");
    }

    #[test]
    fn no_early_stop_before_head_closes() {
        let mut preview = Preview::seeded(&base());
        let binding = base();
        let mut scanner = MetaScanner::new(&binding, PAGE, false, true);
        for token in HtmlTokenizer::new(
            r#"<head><meta property="og:title" content="T"><meta property="og:description" content="D"><meta property="og:image" content="https://cdn.x/i.png">"#,
        ) {
            assert_eq!(scanner.feed(&token, &mut preview).unwrap(), Step::Continue);
        }
        assert_eq!(
            scanner.feed(&Token::end("head"), &mut preview).unwrap(),
            Step::EarlyStop
        );
    }

    #[test]
    fn title_tag_before_og_title_wins() {
        let (_, preview) =
            scan(r#"<head><title>Hello</title><meta property="og:title" content="OG"></head>"#);
        assert_eq!(preview.title, "Hello");
    }

    #[test]
    fn og_title_before_title_tag_wins() {
        let (_, preview) =
            scan(r#"<head><meta property="og:title" content="OG"><title>Hello</title></head>"#);
        assert_eq!(preview.title, "OG");
    }

    #[test]
    fn title_text_is_trimmed_and_entity_decoded() {
        let (_, preview) = scan("<title>\n  Fish &amp; Chips \n</title>");
        assert_eq!(preview.title, "Fish & Chips");
    }

    #[test]
    fn empty_title_does_not_swallow_next_tag() {
        let (_, preview) = scan(r#"<title></title><meta property="og:title" content="OG">"#);
        assert_eq!(preview.title, "OG");
    }

    #[test]
    fn og_description_beats_generic_description() {
        let (_, preview) = scan(
            r#"<meta name="description" content="generic"><meta property="og:description" content="og">"#,
        );
        assert_eq!(preview.description, "og");

        let (_, preview) = scan(
            r#"<meta property="og:description" content="og"><meta name="description" content="generic">"#,
        );
        assert_eq!(preview.description, "og");

        let (_, preview) = scan(
            r#"<meta name="description" content="first"><meta name="description" content="second">"#,
        );
        assert_eq!(preview.description, "first");
    }

    #[test]
    fn meta_with_other_attribute_counts_is_ignored() {
        let (_, preview) = scan(
            r#"<meta charset="utf-8"><meta property="og:title" content="T" data-x="1"><meta name="description" content="ok">"#,
        );
        assert_eq!(preview.title, "");
        assert_eq!(preview.description, "ok");
    }

    #[test]
    fn meta_keys_are_case_insensitive() {
        let (_, preview) = scan(r#"<meta PROPERTY=" OG:Site_Name " content="Example News">"#);
        assert_eq!(preview.name, "Example News");
    }

    #[test]
    fn records_type_site_name_and_url() {
        let (_, preview) = scan(
            r#"<meta property="og:type" content="article"><meta property="og:site_name" content="Ex"><meta property="og:url" content="https://ex.com/canonical">"#,
        );
        assert_eq!(preview.kind, "article");
        assert_eq!(preview.name, "Ex");
        assert_eq!(preview.link, "https://ex.com/canonical");
    }

    #[test]
    fn img_sources_are_absolutized() {
        let (_, preview) =
            scan(r#"<body><img src="/a.png"><img src="https://cdn.x/y.png"><img src=""><img alt="none"></body>"#);
        assert_eq!(preview.images, vec!["https://ex.com/a.png", "https://cdn.x/y.png"]);
    }

    #[test]
    fn og_image_replaces_and_freezes_images() {
        let (_, preview) = scan(
            r#"<head></head><body><img src="/before.png"><meta property="og:image" content="/og.png"><img src="/after.png"></body>"#,
        );
        assert_eq!(preview.images, vec!["https://ex.com/og.png"]);
    }

    #[test]
    fn without_og_image_scans_to_the_end() {
        let (outcome, preview) = scan(
            r#"<head><title>T</title><meta name="description" content="D"></head><body><img src="/late.png">"#,
        );
        assert_eq!(outcome, ScanOutcome::Exhausted);
        assert_eq!(preview.title, "T");
        assert_eq!(preview.description, "D");
        assert_eq!(preview.images, vec!["https://ex.com/late.png"]);
    }

    #[test]
    fn run_starts_from_an_empty_image_list() {
        let base = base();
        let mut preview = Preview::seeded(&base);
        preview.images = vec!["https://ex.com/stale.png".to_string()];
        MetaScanner::new(&base, PAGE, false, true)
            .run(HtmlTokenizer::new(r#"<body><img src="/fresh.png">"#), &mut preview)
            .unwrap();
        assert_eq!(preview.images, vec!["https://ex.com/fresh.png"]);
    }

    #[test]
    fn icon_link_is_resolved() {
        let (_, preview) = scan(r#"<link rel="shortcut icon" href="/static/fav.png">"#);
        assert_eq!(preview.icon, "https://ex.com/static/fav.png");
    }

    #[test]
    fn canonical_fires_after_head() {
        let (outcome, _) = scan(
            r#"<head><link rel="canonical" href="https://other.example/x"><title>Here</title></head><body>"#,
        );
        assert_eq!(
            outcome,
            ScanOutcome::Redirect(Redirect::Canonical(
                Url::parse("https://other.example/x").unwrap()
            ))
        );
    }

    #[test]
    fn canonical_is_absolutized() {
        let (outcome, _) = scan(r#"<link rel="canonical" href="/x?y=1"></head>"#);
        assert_eq!(
            outcome,
            ScanOutcome::Redirect(Redirect::Canonical(Url::parse("https://ex.com/x?y=1").unwrap()))
        );
    }

    #[test]
    fn canonical_to_self_is_ignored() {
        let (outcome, _) = scan(r#"<link rel="canonical" href="/p"></head>"#);
        assert_eq!(outcome, ScanOutcome::Exhausted);
    }

    #[test]
    fn redirects_not_taken_without_budget() {
        let (outcome, preview) = scan_with(
            r#"<head><link rel="canonical" href="https://other.example/x"><meta name="fragment" content="!"><title>Here</title></head><body>"#,
            false,
            false,
        );
        assert_eq!(outcome.unwrap(), ScanOutcome::Exhausted);
        assert_eq!(preview.title, "Here");
    }

    #[test]
    fn fragment_marker_requests_escaped_fetch() {
        let (outcome, _) = scan(r#"<head><meta name="fragment" content="!"></head>"#);
        assert_eq!(outcome, ScanOutcome::Redirect(Redirect::Fragment));
    }

    #[test]
    fn fragment_marker_ignored_when_already_escaped() {
        let (outcome, _) = scan_with(r#"<head><meta name="fragment" content="!"></head>"#, true, true);
        assert_eq!(outcome.unwrap(), ScanOutcome::Exhausted);
    }

    #[test]
    fn canonical_takes_priority_over_fragment() {
        let (outcome, _) = scan(
            r#"<head><meta name="fragment" content="!"><link rel="canonical" href="https://other.example/x"></head>"#,
        );
        assert!(matches!(outcome, ScanOutcome::Redirect(Redirect::Canonical(_))));
    }

    #[test]
    fn malformed_src_aborts() {
        let (outcome, _) = scan_with(r#"<img src="http://[::1">"#, false, true);
        assert!(matches!(outcome, Err(ScrapeError::UrlParse { .. })));
    }
}

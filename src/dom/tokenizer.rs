//! Pull-style token stream over the html5ever tokenizer.
//!
//! Input is fed to html5ever in fixed-size chunks only as tokens are pulled,
//! so a consumer that stops early never tokenizes the rest of the document.
//! No tree is built.

use std::collections::VecDeque;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token as RawToken, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts, TokenizerResult,
};

use super::{Token, TokenKind};

const CHUNK_LEN: usize = 8 * 1024;

/// Collects html5ever tokens, merging adjacent character runs into one
/// text token.
#[derive(Default)]
struct Collector {
    tokens: VecDeque<Token>,
}

impl Collector {
    fn push_text(&mut self, text: &str) {
        if let Some(last) = self.tokens.back_mut() {
            if last.kind == TokenKind::Text {
                last.text.push_str(text);
                return;
            }
        }
        self.tokens.push_back(Token::text(text));
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: RawToken, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            RawToken::TagToken(tag) => {
                let name = tag.name.to_string();
                let kind = match tag.kind {
                    TagKind::StartTag if tag.self_closing => TokenKind::SelfClosingTag,
                    TagKind::StartTag => TokenKind::StartTag,
                    TagKind::EndTag => TokenKind::EndTag,
                };
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                    .collect();

                // Without a tree builder nobody else switches the tokenizer
                // into raw text modes.
                let next = if kind == TokenKind::StartTag {
                    content_model(&name)
                } else {
                    TokenSinkResult::Continue
                };

                self.tokens.push_back(Token {
                    kind,
                    name,
                    attrs,
                    text: String::new(),
                });
                return next;
            }
            RawToken::CharacterTokens(text) => self.push_text(&text),
            RawToken::CommentToken(text) => self.tokens.push_back(Token::comment(text.to_string())),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn content_model(tag: &str) -> TokenSinkResult<()> {
    match tag {
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

/// Iterator of [`Token`]s over an HTML document.
pub struct HtmlTokenizer<'a> {
    input: &'a str,
    offset: usize,
    queue: BufferQueue,
    inner: Tokenizer<Collector>,
    ended: bool,
}

impl<'a> HtmlTokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            queue: BufferQueue::default(),
            inner: Tokenizer::new(Collector::default(), TokenizerOpts::default()),
            ended: false,
        }
    }

    /// Bytes of input handed to the tokenizer so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    fn pump(&mut self) {
        if self.offset >= self.input.len() {
            self.inner.end();
            self.ended = true;
            return;
        }

        let mut end = (self.offset + CHUNK_LEN).min(self.input.len());
        while !self.input.is_char_boundary(end) {
            end += 1;
        }
        self.queue
            .push_back(StrTendril::from_slice(&self.input[self.offset..end]));
        self.offset = end;
        // The collector never asks for a script pause, so feeding always
        // runs the whole chunk through.
        if let TokenizerResult::Script(()) = self.inner.feed(&mut self.queue) {
            log::debug!("Tokenizer paused for a script; continuing");
        }
    }
}

impl Iterator for HtmlTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let tokens = &self.inner.sink.tokens;
            // A trailing text run may continue in the next chunk.
            let ready = match tokens.len() {
                0 => false,
                1 => self.ended || tokens[0].kind != TokenKind::Text,
                _ => true,
            };
            if ready {
                return self.inner.sink.tokens.pop_front();
            }
            if self.ended {
                return None;
            }
            self.pump();
        }
    }
}

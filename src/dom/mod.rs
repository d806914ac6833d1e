pub mod tokenizer;

pub use tokenizer::HtmlTokenizer;

/// Kind of a lexical HTML token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartTag,
    EndTag,
    SelfClosingTag,
    Text,
    Comment,
}

/// One token of the stream. Tag and attribute names are lowercase;
/// attributes keep document order. `text` is only set for text and
/// comment tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl Token {
    pub fn start(name: impl Into<String>, attrs: &[(&str, &str)]) -> Self {
        Self::tag(TokenKind::StartTag, name, attrs)
    }

    pub fn end(name: impl Into<String>) -> Self {
        Self::tag(TokenKind::EndTag, name, &[])
    }

    pub fn self_closing(name: impl Into<String>, attrs: &[(&str, &str)]) -> Self {
        Self::tag(TokenKind::SelfClosingTag, name, attrs)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            name: String::new(),
            attrs: Vec::new(),
            text: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Comment,
            ..Self::text(content)
        }
    }

    fn tag(kind: TokenKind, name: impl Into<String>, attrs: &[(&str, &str)]) -> Self {
        Self {
            kind,
            name: name.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: String::new(),
        }
    }

    /// Start, end or self-closing tag.
    pub fn is_tag(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::SelfClosingTag
        )
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Everything that can make a scrape fail. There is no partial success:
/// any of these aborts the whole session.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL {input:?}: {source}")]
    UrlParse {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Could not unescape URL {0:?}")]
    UrlDecode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Document exceeds size limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },
}

impl ScrapeError {
    pub(crate) fn url_parse(input: &str, source: url::ParseError) -> Self {
        ScrapeError::UrlParse {
            input: input.to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        ScrapeError::Transport(format!("Failed to read body: {}", err))
    }
}

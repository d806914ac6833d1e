use serde::Serialize;
use url::Url;

use crate::net::resolve::{host_of, origin_of};

/// Link preview of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Site icon, `<origin>/favicon.ico` unless the page names one.
    pub icon: String,
    /// Site name, the host unless `og:site_name` is present.
    pub name: String,
    pub title: String,
    pub description: String,
    /// `og:type`
    #[serde(rename = "type")]
    pub kind: String,
    /// The `og:image`, or every `<img src>` when there is none.
    pub images: Vec<String>,
    pub link: String,
}

impl Preview {
    /// Fresh preview for a page fetched as `url`, with every default filled in.
    pub fn seeded(url: &Url) -> Self {
        Self {
            icon: format!("{}/favicon.ico", origin_of(url)),
            name: host_of(url),
            link: url.to_string(),
            ..Self::default()
        }
    }

    /// Enough to stop reading the page early.
    pub(crate) fn has_title_and_description(&self) -> bool {
        !self.title.is_empty() && !self.description.is_empty()
    }
}

//! Inline BibTeX carried in a `bib=` query parameter.
//!
//! Some sites link to their pages with the citation attached, e.g.
//! `theory.smarts.html?bib=%2540misc%257B...`. The value is usually encoded
//! twice, so it is decoded once more after query parsing.

use async_trait::async_trait;
use url::Url;

use crate::bibtex::parse_entry;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata};

const BIB_PARAM: &str = "bib";

/// `bib=` query parameter handler (no network I/O)
#[derive(Debug, Clone, Default)]
pub struct UrlParamHandler;

impl UrlParamHandler {
    /// Create a new URL parameter handler
    pub fn new() -> Self {
        Self
    }

    /// Decoded value of the first `bib` parameter
    pub fn extract_bibtex(url: &str) -> Option<String> {
        let parsed = Url::parse(url.trim()).ok()?;
        let (_, value) = parsed.query_pairs().find(|(key, _)| key == BIB_PARAM)?;

        let decoded = urlencoding::decode(&value)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| value.into_owned());
        let decoded = decoded.trim();

        if decoded.is_empty() {
            None
        } else {
            Some(decoded.to_string())
        }
    }
}

#[async_trait]
impl Handler for UrlParamHandler {
    fn id(&self) -> &str {
        "url_param"
    }

    fn name(&self) -> &str {
        "URL Parameter"
    }

    fn description(&self) -> &str {
        "Any URL carrying a BibTeX entry in its bib= query parameter"
    }

    fn recognize(&self, url: &str) -> bool {
        Url::parse(url.trim())
            .map(|parsed| parsed.query_pairs().any(|(key, _)| key == BIB_PARAM))
            .unwrap_or(false)
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let bibtex = Self::extract_bibtex(url)
            .ok_or_else(|| HandlerError::Parse(format!("Empty bib parameter in {}", url)))?;
        parse_entry(&bibtex, EntryType::Misc)
    }
}

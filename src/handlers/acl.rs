//! ACL Anthology handler.
//!
//! Every Anthology paper has a BibTeX export at `<id>.bib`, which is parsed
//! and re-rendered.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::bibtex::parse_entry;
use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, IdentifierKind, Metadata};
use crate::utils::HttpClient;

/// New-style (`2024.findings-emnlp.746`) and legacy (`N19-1423`) anthology IDs
static ACL_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.)?(?:aclanthology\.org|aclweb\.org/anthology)/([A-Za-z0-9.\-]+?)(?:\.pdf|\.bib)?/?(?:[?#].*)?$",
    )
    .unwrap()
});

/// ACL Anthology handler
#[derive(Debug, Clone)]
pub struct AclAnthologyHandler {
    client: Arc<HttpClient>,
    base_url: String,
}

impl AclAnthologyHandler {
    /// Create a new ACL Anthology handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(client, &config.endpoints.acl_anthology)
    }

    /// Create with a custom Anthology base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Anthology ID from a paper, PDF or .bib URL
    ///
    /// Venue and event index pages (`/venues/acl/`, `/events/`) are not papers;
    /// paper IDs always contain a digit.
    pub fn extract_id(url: &str) -> Option<String> {
        let id = ACL_URL_RE.captures(url.trim())?.get(1)?.as_str();
        if id.chars().any(|c| c.is_ascii_digit()) {
            Some(id.to_string())
        } else {
            None
        }
    }
}

#[async_trait]
impl Handler for AclAnthologyHandler {
    fn id(&self) -> &str {
        "acl"
    }

    fn name(&self) -> &str {
        "ACL Anthology"
    }

    fn description(&self) -> &str {
        "ACL Anthology papers, read from the Anthology's BibTeX export"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_id(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let id = Self::extract_id(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not an ACL Anthology URL: {}", url)))?;

        let bib_url = format!("{}/{}.bib", self.base_url, id);
        debug!("Fetching ACL Anthology entry {}", id);

        let response = self
            .client
            .fetch_text(&bib_url, Some("text/plain"), &[])
            .await?;

        let mut metadata = parse_entry(&response.body, EntryType::InProceedings)?;
        metadata
            .identifiers
            .entry(IdentifierKind::Url)
            .or_insert_with(|| format!("https://aclanthology.org/{}", id));
        Ok(metadata)
    }
}

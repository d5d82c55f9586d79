//! DOI handler.
//!
//! Resolves DOIs through content negotiation: the resolver is asked for
//! `application/x-bibtex` and the returned entry is read back into the
//! metadata model. Other handlers that end up with a DOI (bioRxiv,
//! ScienceDirect, IEEE Xplore) delegate to [`DoiHandler::resolve`].

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

/// `doi.org/10.x/...`, `dx.doi.org/...`, `doi:10.x/...` and publisher paths
/// such as `/doi/full/10.x/...`
static DOI_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:https?://)?(?:dx\.)?doi\.org/|doi:|/doi(?:/[a-z]+)*/)(10\.\d+/[^\s?#]+)")
        .unwrap()
});

const BIBTEX_MIME: &str = "application/x-bibtex";

/// DOI handler
#[derive(Debug, Clone)]
pub struct DoiHandler {
    client: Arc<HttpClient>,
    resolver_url: String,
}

impl DoiHandler {
    /// Create a new DOI handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(client, &config.endpoints.doi_resolver)
    }

    /// Create with a custom resolver base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, resolver_url: &str) -> Self {
        Self {
            client,
            resolver_url: resolver_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract a DOI from a URL or `doi:` string
    pub fn extract_doi(url: &str) -> Option<String> {
        let raw = DOI_URL_RE.captures(url.trim())?.get(1)?.as_str();
        let decoded = urlencoding::decode(raw)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        Some(decoded.trim_end_matches('/').to_string())
    }

    /// Resolve a bare DOI into metadata
    pub async fn resolve(&self, doi: &str) -> Result<Metadata, HandlerError> {
        let resolver_url = format!("{}/{}", self.resolver_url, doi);
        debug!("Resolving DOI {}", doi);

        let response = self
            .client
            .fetch_text(&resolver_url, Some(BIBTEX_MIME), &[])
            .await?;

        if !response.body.trim_start().starts_with('@') {
            return Err(HandlerError::Parse(format!(
                "DOI resolver returned no BibTeX for {} (content type {})",
                doi,
                response.content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let mut metadata = parse_entry(&response.body, EntryType::Article)?;
        metadata
            .identifiers
            .entry(IdentifierKind::Doi)
            .or_insert_with(|| doi.to_string());
        metadata
            .identifiers
            .entry(IdentifierKind::Url)
            .or_insert_with(|| format!("https://doi.org/{}", doi));

        Ok(metadata)
    }
}

#[async_trait]
impl Handler for DoiHandler {
    fn id(&self) -> &str {
        "doi"
    }

    fn name(&self) -> &str {
        "DOI"
    }

    fn description(&self) -> &str {
        "DOI links and publisher /doi/ pages, resolved by BibTeX content negotiation"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_doi(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let doi = Self::extract_doi(url)
            .ok_or_else(|| HandlerError::Parse(format!("No DOI found in {}", url)))?;
        self.resolve(&doi).await
    }
}

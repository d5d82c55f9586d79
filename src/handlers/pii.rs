//! ScienceDirect and Cell Press handler.
//!
//! Elsevier article URLs identify papers by PII (Publisher Item Identifier)
//! rather than DOI. CrossRef records PIIs as alternative IDs, so one lookup
//! there yields the DOI, which is then resolved.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::DoiHandler;
use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::Metadata;
use crate::utils::HttpClient;

static SCIENCEDIRECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"sciencedirect\.com/science/article/(?:abs/)?pii/([A-Z0-9]+)").unwrap()
});

/// Cell Press formats PIIs as `S0092-8674(25)00927-4`
static CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"cell\.com/[^/]+/(?:fulltext|abstract|pdf)/(S\d{4}-\d{3}[\dX]\(\d{2}\)\d{5}-[\dX])")
        .unwrap()
});

/// ScienceDirect / Cell Press PII handler
#[derive(Debug, Clone)]
pub struct PiiHandler {
    client: Arc<HttpClient>,
    crossref_url: String,
    doi: DoiHandler,
}

impl PiiHandler {
    /// Create a new PII handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(
            client.clone(),
            &config.endpoints.crossref_api,
            DoiHandler::new(client, config),
        )
    }

    /// Create with a custom CrossRef base URL and DOI handler (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, crossref_url: &str, doi: DoiHandler) -> Self {
        Self {
            client,
            crossref_url: crossref_url.trim_end_matches('/').to_string(),
            doi,
        }
    }

    /// Normalized PII (no parentheses or hyphens) from a ScienceDirect or
    /// Cell Press URL
    pub fn extract_pii(url: &str) -> Option<String> {
        if let Some(caps) = SCIENCEDIRECT_RE.captures(url) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }

        CELL_RE
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| normalize_pii(m.as_str()))
    }

    /// Look up the DOI registered for a PII
    async fn doi_for_pii(&self, pii: &str) -> Result<String, HandlerError> {
        let api_url = format!(
            "{}/works?filter=alternative-id:{}&rows=1",
            self.crossref_url, pii
        );
        debug!("Looking up DOI for PII {}", pii);

        let data: Value = self.client.fetch_json(&api_url, &[]).await?;
        data.pointer("/message/items/0/DOI")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HandlerError::Parse(format!("No DOI registered for PII {}", pii)))
    }
}

fn normalize_pii(formatted: &str) -> String {
    formatted
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-'))
        .collect()
}

#[async_trait]
impl Handler for PiiHandler {
    fn id(&self) -> &str {
        "pii"
    }

    fn name(&self) -> &str {
        "ScienceDirect / Cell Press"
    }

    fn description(&self) -> &str {
        "ScienceDirect and Cell Press article pages, PII mapped to a DOI through CrossRef"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_pii(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let pii = Self::extract_pii(url)
            .ok_or_else(|| HandlerError::Parse(format!("No PII found in {}", url)))?;
        let doi = self.doi_for_pii(&pii).await?;
        self.doi.resolve(&doi).await
    }
}

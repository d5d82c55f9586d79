//! bioRxiv and medRxiv handler.
//!
//! Preprint pages carry their DOI in the path; the version suffix is dropped
//! and the DOI is resolved like any other.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::DoiHandler;
use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::Metadata;
use crate::utils::HttpClient;

/// Dated (`10.1101/2023.04.25.537981`) and legacy numeric (`10.1101/123456`) DOIs
static BIORXIV_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.)?(?:biorxiv|medrxiv)\.org/content/(?:early/\d{4}/\d{2}/\d{2}/)?(10\.1101/(?:\d{4}\.\d{2}\.\d{2}\.\d+|\d+))(?:v\d+)?",
    )
    .unwrap()
});

/// bioRxiv/medRxiv handler
#[derive(Debug, Clone)]
pub struct BiorxivHandler {
    doi: DoiHandler,
}

impl BiorxivHandler {
    /// Create a new bioRxiv handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_doi_handler(DoiHandler::new(client, config))
    }

    /// Create with an existing DOI handler (for testing)
    pub fn with_doi_handler(doi: DoiHandler) -> Self {
        Self { doi }
    }

    /// Extract the version-less DOI from a content URL
    pub fn extract_doi(url: &str) -> Option<String> {
        BIORXIV_URL_RE
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl Handler for BiorxivHandler {
    fn id(&self) -> &str {
        "biorxiv"
    }

    fn name(&self) -> &str {
        "bioRxiv / medRxiv"
    }

    fn description(&self) -> &str {
        "bioRxiv and medRxiv preprint pages, resolved through their DOI"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_doi(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let doi = Self::extract_doi(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not a bioRxiv URL: {}", url)))?;
        self.doi.resolve(&doi).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_doi() {
        assert_eq!(
            BiorxivHandler::extract_doi(
                "https://www.biorxiv.org/content/10.1101/2023.04.25.537981v2"
            ),
            Some("10.1101/2023.04.25.537981".to_string())
        );
        assert_eq!(
            BiorxivHandler::extract_doi(
                "https://www.biorxiv.org/content/10.1101/2023.04.25.537981v1.full.pdf"
            ),
            Some("10.1101/2023.04.25.537981".to_string())
        );
        assert_eq!(
            BiorxivHandler::extract_doi("https://www.medrxiv.org/content/10.1101/2020.03.04.20030395v1"),
            Some("10.1101/2020.03.04.20030395".to_string())
        );
        assert_eq!(
            BiorxivHandler::extract_doi("https://www.biorxiv.org/content/early/2017/03/24/120014"),
            None
        );
        assert_eq!(BiorxivHandler::extract_doi("https://www.biorxiv.org/"), None);
    }

    #[tokio::test]
    async fn test_resolves_through_doi() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/10.1101/2023.04.25.537981")
            .match_header("accept", "application/x-bibtex")
            .with_status(200)
            .with_body("@misc{Smith_2023, title={A Preprint}, author={Smith, Anna}, year={2023}, publisher={Cold Spring Harbor Laboratory}, DOI={10.1101/2023.04.25.537981}}")
            .create_async()
            .await;

        let doi = DoiHandler::with_base_url(Arc::new(HttpClient::new()), &server.url());
        let handler = BiorxivHandler::with_doi_handler(doi);
        let metadata = handler
            .extract("https://www.biorxiv.org/content/10.1101/2023.04.25.537981v2")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.authors, vec!["Anna Smith"]);
        assert_eq!(metadata.doi(), Some("10.1101/2023.04.25.537981"));
    }
}

//! IEEE Xplore handler.
//!
//! Xplore document pages embed the DOI in several places depending on page
//! generation. The first DOI found is resolved through [`DoiHandler`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

use super::DoiHandler;
use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::Metadata;
use crate::utils::{clean_doi, HttpClient};

static IEEE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?ieeexplore\.ieee\.org/(?:abstract/)?document/(\d+)").unwrap()
});

static CITATION_DOI_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="citation_doi"]"#).unwrap());

/// Patterns tried against the raw page, in order
static PAGE_DOI_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""doi"\s*:\s*"(10\.\d+/[^"]+)""#,
        r#""xplore-pub-doi"\s*:\s*"(10\.\d+/[^"]+)""#,
        r#"https?://(?:dx\.)?doi\.org/(10\.\d+/[^\s'"<>]+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// IEEE Xplore handler
#[derive(Debug, Clone)]
pub struct IeeeHandler {
    client: Arc<HttpClient>,
    base_url: String,
    doi: DoiHandler,
}

impl IeeeHandler {
    /// Create a new IEEE Xplore handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(
            client.clone(),
            &config.endpoints.ieee_xplore,
            DoiHandler::new(client, config),
        )
    }

    /// Create with a custom Xplore base URL and DOI handler (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, base_url: &str, doi: DoiHandler) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            doi,
        }
    }

    /// Extract the numeric document number
    pub fn extract_document_id(url: &str) -> Option<String> {
        IEEE_URL_RE
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Find the DOI of a document page
    pub fn find_doi(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let from_meta = document
            .select(&CITATION_DOI_SELECTOR)
            .filter_map(|el| el.value().attr("content"))
            .find_map(clean_doi);
        if from_meta.is_some() {
            return from_meta;
        }

        PAGE_DOI_RES
            .iter()
            .filter_map(|re| re.captures(html))
            .filter_map(|caps| caps.get(1))
            .find_map(|m| clean_doi(m.as_str()))
    }
}

#[async_trait]
impl Handler for IeeeHandler {
    fn id(&self) -> &str {
        "ieee"
    }

    fn name(&self) -> &str {
        "IEEE Xplore"
    }

    fn description(&self) -> &str {
        "IEEE Xplore document pages, DOI read from the page and resolved"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_document_id(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let document_id = Self::extract_document_id(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not an IEEE Xplore URL: {}", url)))?;

        let page_url = format!("{}/document/{}", self.base_url, document_id);
        let page = self
            .client
            .fetch_text(&page_url, Some("text/html"), &[])
            .await?;

        let doi = Self::find_doi(&page.body).ok_or_else(|| {
            HandlerError::Parse(format!("No DOI found on IEEE document {}", document_id))
        })?;
        debug!("IEEE document {} has DOI {}", document_id, doi);

        self.doi.resolve(&doi).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_document_id() {
        assert_eq!(
            IeeeHandler::extract_document_id("https://ieeexplore.ieee.org/document/10962332"),
            Some("10962332".to_string())
        );
        assert_eq!(
            IeeeHandler::extract_document_id(
                "https://ieeexplore.ieee.org/abstract/document/8014831/"
            ),
            Some("8014831".to_string())
        );
        assert_eq!(
            IeeeHandler::extract_document_id("https://ieeexplore.ieee.org/xpl/conhome/1000639"),
            None
        );
    }

    #[test]
    fn test_find_doi_sources() {
        let meta = r#"<html><head><meta name="citation_doi" content="10.1109/TPAMI.2020.1234"></head></html>"#;
        assert_eq!(
            IeeeHandler::find_doi(meta),
            Some("10.1109/TPAMI.2020.1234".to_string())
        );

        let json = r#"<script>xplGlobal.document.metadata={"title":"X","doi":"10.1109/CVPR.2017.243","isbn":[]};</script>"#;
        assert_eq!(
            IeeeHandler::find_doi(json),
            Some("10.1109/CVPR.2017.243".to_string())
        );

        let link = r#"<a href="https://doi.org/10.1109/LRA.2025.3560871">DOI</a>"#;
        assert_eq!(
            IeeeHandler::find_doi(link),
            Some("10.1109/LRA.2025.3560871".to_string())
        );

        assert_eq!(IeeeHandler::find_doi("<html><body>Sign in</body></html>"), None);
    }

    #[tokio::test]
    async fn test_page_then_doi() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/document/8099726")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<script>var m={"doi":"10.1109/CVPR.2017.243"};</script>"#)
            .create_async()
            .await;
        let resolver = server
            .mock("GET", "/10.1109/CVPR.2017.243")
            .with_status(200)
            .with_body("@inproceedings{Huang_2017, title={Densely Connected Convolutional Networks}, booktitle={2017 IEEE Conference on Computer Vision and Pattern Recognition (CVPR)}, author={Huang, Gao and Liu, Zhuang}, year={2017}}")
            .create_async()
            .await;

        let client = Arc::new(HttpClient::new());
        let doi = DoiHandler::with_base_url(client.clone(), &server.url());
        let handler = IeeeHandler::with_base_url(client, &server.url(), doi);

        let metadata = handler
            .extract("https://ieeexplore.ieee.org/document/8099726")
            .await
            .unwrap();

        page.assert_async().await;
        resolver.assert_async().await;
        assert_eq!(metadata.title, "Densely Connected Convolutional Networks");
        assert_eq!(metadata.authors, vec!["Gao Huang", "Zhuang Liu"]);
        assert_eq!(metadata.doi(), Some("10.1109/CVPR.2017.243"));
    }

    #[tokio::test]
    async fn test_page_without_doi_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/document/1")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let client = Arc::new(HttpClient::new());
        let doi = DoiHandler::with_base_url(client.clone(), &server.url());
        let handler = IeeeHandler::with_base_url(client, &server.url(), doi);

        let err = handler
            .extract("https://ieeexplore.ieee.org/document/1")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Parse(_)));
    }
}

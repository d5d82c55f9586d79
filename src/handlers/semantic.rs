//! Semantic Scholar handler.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};
use crate::utils::{normalize_whitespace, parse_web_url, HttpClient};

/// Fields requested from the Graph API
const PAPER_FIELDS: &str =
    "title,authors,year,venue,publicationVenue,externalIds,publicationTypes,journal";

/// Public paper page prefix
const SEMANTIC_SCHOLAR_PAPER_URL: &str = "https://www.semanticscholar.org/paper";

/// Semantic Scholar handler
///
/// Reads paper records from the Semantic Scholar Graph API. An API key from
/// configuration is sent as `x-api-key` when present.
#[derive(Debug, Clone)]
pub struct SemanticScholarHandler {
    client: Arc<HttpClient>,
    api_url: String,
    api_key: Option<String>,
}

impl SemanticScholarHandler {
    /// Create a new Semantic Scholar handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            api_key: config.api_keys.semantic_scholar.clone(),
            ..Self::with_base_url(client, &config.endpoints.semantic_scholar_api)
        }
    }

    /// Create with a custom API base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Paper ID: the last path segment of a `/paper/...` URL
    ///
    /// Accepts both `/paper/<slug>/<id>` and `/paper/<id>`.
    pub fn extract_id(url: &str) -> Option<String> {
        let parsed = parse_web_url(url)?;
        let host = parsed.host_str()?;
        if host != "semanticscholar.org" && !host.ends_with(".semanticscholar.org") {
            return None;
        }

        let segments: Vec<&str> = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            ["paper", .., id] if is_paper_id(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn build_metadata(id: &str, paper: SemanticPaper) -> Result<Metadata, HandlerError> {
        let types = paper.publication_types.unwrap_or_default();
        let entry_type = if types.iter().any(|t| t == "Conference") {
            EntryType::InProceedings
        } else if types.iter().any(|t| t == "Book") {
            EntryType::Book
        } else {
            EntryType::Article
        };

        let journal = paper.journal.unwrap_or_default();
        let venue_name = paper.venue.filter(|v| !v.trim().is_empty());
        let publication_venue = paper
            .publication_venue
            .and_then(|v| v.name)
            .filter(|v| !v.trim().is_empty());
        let journal_name = journal.name.clone().filter(|v| !v.trim().is_empty());

        let venue = match entry_type {
            EntryType::Article => journal_name.or(venue_name).or(publication_venue),
            _ => venue_name.or(publication_venue).or(journal_name),
        };

        let ids = paper.external_ids.unwrap_or_default();

        let mut builder = MetadataBuilder::new(
            normalize_whitespace(&paper.title.unwrap_or_default()),
            entry_type,
        )
        .authors(
            paper
                .authors
                .unwrap_or_default()
                .into_iter()
                .filter_map(|a| a.name)
                .map(|n| normalize_whitespace(&n)),
        )
        .year(paper.year)
        .volume(journal.volume.unwrap_or_default())
        .pages(journal.pages.unwrap_or_default().trim().to_string())
        .doi(ids.doi.unwrap_or_default())
        .arxiv_id(ids.arxiv.unwrap_or_default())
        .url(format!("{}/{}", SEMANTIC_SCHOLAR_PAPER_URL, id));

        if let Some(venue) = venue {
            builder = builder.venue(normalize_whitespace(&venue));
        }

        builder.build().ensure_usable()
    }
}

fn is_paper_id(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric())
}

#[async_trait]
impl Handler for SemanticScholarHandler {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    fn description(&self) -> &str {
        "Semantic Scholar paper pages, resolved through the Semantic Scholar Graph API"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_id(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let id = Self::extract_id(url).ok_or_else(|| {
            HandlerError::Parse(format!("Not a Semantic Scholar paper URL: {}", url))
        })?;

        let api_url = format!("{}/paper/{}?fields={}", self.api_url, id, PAPER_FIELDS);
        debug!("Fetching Semantic Scholar paper {}", id);

        let headers: Vec<(&str, &str)> = self
            .api_key
            .as_deref()
            .map(|key| vec![("x-api-key", key)])
            .unwrap_or_default();

        let paper: SemanticPaper = self.client.fetch_json(&api_url, &headers).await?;
        Self::build_metadata(&id, paper)
    }
}

// ========== API RESPONSE TYPES ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SemanticPaper {
    title: Option<String>,
    authors: Option<Vec<SemanticAuthor>>,
    year: Option<i32>,
    venue: Option<String>,
    publication_venue: Option<PublicationVenue>,
    external_ids: Option<ExternalIds>,
    publication_types: Option<Vec<String>>,
    journal: Option<Journal>,
}

#[derive(Debug, Deserialize)]
struct SemanticAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicationVenue {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Journal {
    name: Option<String>,
    volume: Option<String>,
    pages: Option<String>,
}

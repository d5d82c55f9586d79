//! GitHub repository handler.
//!
//! A repository that ships a `CITATION.cff` is cited the way its authors
//! asked; otherwise the entry is built from the repository metadata of the
//! GitHub REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};
use crate::utils::{clean_doi, extract_year, normalize_whitespace, parse_web_url, HttpClient};

/// Top-level github.com paths that are not repository owners
const RESERVED_OWNERS: &[&str] = &[
    "about",
    "collections",
    "enterprise",
    "explore",
    "features",
    "login",
    "marketplace",
    "notifications",
    "orgs",
    "pricing",
    "settings",
    "sponsors",
    "topics",
    "trending",
];

/// GitHub repository handler
#[derive(Debug, Clone)]
pub struct GithubHandler {
    client: Arc<HttpClient>,
    api_url: String,
    raw_url: String,
    token: Option<String>,
}

impl GithubHandler {
    /// Create a new GitHub handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            token: config.api_keys.github_token.clone(),
            ..Self::with_base_urls(
                client,
                &config.endpoints.github_api,
                &config.endpoints.github_raw,
            )
        }
    }

    /// Create with custom API and raw-content base URLs (for testing)
    pub fn with_base_urls(client: Arc<HttpClient>, api_url: &str, raw_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            raw_url: raw_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Owner and repository name from a github.com URL
    ///
    /// Deeper paths (`/tree/main/src`) and a `.git` suffix are tolerated.
    pub fn extract_repo(url: &str) -> Option<(String, String)> {
        let parsed = parse_web_url(url)?;
        if !matches!(parsed.host_str()?, "github.com" | "www.github.com") {
            return None;
        }

        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        let valid = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(repo) || RESERVED_OWNERS.contains(&owner) {
            return None;
        }

        Some((owner.to_string(), repo.to_string()))
    }

    async fn fetch_citation_cff(&self, owner: &str, repo: &str) -> Option<Metadata> {
        let cff_url = format!("{}/{}/{}/HEAD/CITATION.cff", self.raw_url, owner, repo);

        match self.client.fetch_optional_text(&cff_url, None, &[]).await {
            Ok(Some(response)) => match parse_citation_cff(&response.body, owner, repo) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    warn!("Ignoring unusable CITATION.cff in {}/{}: {}", owner, repo, e);
                    None
                }
            },
            Ok(None) => {
                debug!("No CITATION.cff in {}/{}", owner, repo);
                None
            }
            Err(e) => {
                warn!("Could not fetch CITATION.cff for {}/{}: {}", owner, repo, e);
                None
            }
        }
    }

    async fn fetch_repo_metadata(&self, owner: &str, repo: &str) -> Result<Metadata, HandlerError> {
        let api_url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        let auth = self.token.as_deref().map(|t| format!("Bearer {}", t));

        let mut headers = vec![("Accept", "application/vnd.github+json")];
        if let Some(auth) = auth.as_deref() {
            headers.push(("Authorization", auth));
        }

        let data: RepoResponse = self.client.fetch_json(&api_url, &headers).await?;
        Ok(repo_metadata(data, owner, repo))
    }
}

#[async_trait]
impl Handler for GithubHandler {
    fn id(&self) -> &str {
        "github"
    }

    fn name(&self) -> &str {
        "GitHub"
    }

    fn description(&self) -> &str {
        "GitHub repositories, from CITATION.cff when present, otherwise repository metadata"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_repo(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let (owner, repo) = Self::extract_repo(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not a GitHub repository URL: {}", url)))?;

        if let Some(metadata) = self.fetch_citation_cff(&owner, &repo).await {
            info!("Using CITATION.cff for {}/{}", owner, repo);
            return Ok(metadata);
        }

        self.fetch_repo_metadata(&owner, &repo)
            .await?
            .ensure_usable()
    }
}

fn repo_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{}/{}", owner, repo)
}

// ========== CITATION.cff ==========

/// Parse a CITATION.cff document
fn parse_citation_cff(content: &str, owner: &str, repo: &str) -> Result<Metadata, HandlerError> {
    let doc: YamlValue = serde_yaml::from_str(content)?;
    if !doc.is_mapping() {
        return Err(HandlerError::Parse("CITATION.cff is not a mapping".to_string()));
    }

    let title = yaml_string(&doc, "title")
        .map(|t| normalize_whitespace(&t))
        .unwrap_or_else(|| repo.to_string());

    let mut authors: Vec<String> = doc
        .get("authors")
        .and_then(YamlValue::as_sequence)
        .map(|items| items.iter().filter_map(cff_person).collect())
        .unwrap_or_default();
    if authors.is_empty() {
        authors.push(owner.to_string());
    }

    let year = yaml_string(&doc, "date-released").and_then(|d| extract_year(&d));

    let mut builder = MetadataBuilder::new(title, EntryType::Software)
        .authors(authors)
        .year(year)
        .version(yaml_string(&doc, "version").unwrap_or_default())
        .publisher("GitHub")
        .url(repo_url(owner, repo));

    if let Some(doi) = yaml_string(&doc, "doi").and_then(|d| clean_doi(&d)) {
        builder = builder.doi(doi);
    }

    builder.build().ensure_usable()
}

/// Scalar as string; numbers and booleans are rendered (`version: 1.0`)
fn yaml_string(doc: &YamlValue, key: &str) -> Option<String> {
    let value = match doc.get(key)? {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// A CFF person ("given-names name-particle family-names name-suffix") or
/// entity (`name`)
fn cff_person(person: &YamlValue) -> Option<String> {
    let parts: Vec<String> = ["given-names", "name-particle", "family-names", "name-suffix"]
        .iter()
        .filter_map(|key| yaml_string(person, key))
        .collect();

    if parts.is_empty() {
        yaml_string(person, "name")
    } else {
        Some(normalize_whitespace(&parts.join(" ")))
    }
}

// ========== REPOSITORY API ==========

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: Option<String>,
    description: Option<String>,
    created_at: Option<String>,
    owner: Option<RepoOwner>,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: Option<String>,
}

fn repo_metadata(data: RepoResponse, owner: &str, repo: &str) -> Metadata {
    let login = data
        .owner
        .and_then(|o| o.login)
        .unwrap_or_else(|| owner.to_string());

    MetadataBuilder::new(data.name.unwrap_or_else(|| repo.to_string()), EntryType::Software)
        .author(login)
        .year(data.created_at.as_deref().and_then(extract_year))
        .publisher("GitHub")
        .note(normalize_whitespace(&data.description.unwrap_or_default()))
        .url(repo_url(owner, repo))
        .build()
}

//! OpenReview handler.

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};
use crate::utils::{extract_year, normalize_whitespace, parse_web_url, HttpClient};

/// Public forum page prefix
const OPENREVIEW_FORUM_URL: &str = "https://openreview.net/forum";

/// `<Venue>/<YYYY>/Conference` in an invitation ID
static INVITATION_VENUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^/]+)/\d{4}/Conference").unwrap());

/// OpenReview handler
///
/// Reads notes from the OpenReview API. Both API v1 (plain content values)
/// and v2 (`{"value": ...}` wrappers) responses are accepted.
#[derive(Debug, Clone)]
pub struct OpenReviewHandler {
    client: Arc<HttpClient>,
    api_url: String,
}

impl OpenReviewHandler {
    /// Create a new OpenReview handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(client, &config.endpoints.openreview_api)
    }

    /// Create with a custom API base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract the note ID from a forum or PDF URL
    pub fn extract_id(url: &str) -> Option<String> {
        let parsed = parse_web_url(url)?;
        let host = parsed.host_str()?;
        if host != "openreview.net" && !host.ends_with(".openreview.net") {
            return None;
        }
        if !matches!(parsed.path(), "/forum" | "/pdf" | "/forum/" | "/pdf/") {
            return None;
        }

        parsed
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| {
                !id.is_empty()
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            })
    }

    fn build_metadata(id: &str, note: &Value) -> Result<Metadata, HandlerError> {
        let content = note
            .get("content")
            .ok_or_else(|| HandlerError::Parse(format!("OpenReview note {} has no content", id)))?;

        let title = content_value(content, "title")
            .and_then(|v| match v {
                Value::Array(items) => items.first().and_then(Value::as_str),
                other => other.as_str(),
            })
            .map(normalize_whitespace)
            .unwrap_or_default();

        let authors: Vec<String> = match content_value(content, "authors") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(normalize_whitespace)
                .collect(),
            Some(Value::String(name)) => vec![normalize_whitespace(name)],
            _ => Vec::new(),
        };

        let venue = content_value(content, "venue")
            .and_then(Value::as_str)
            .map(normalize_whitespace)
            .filter(|v| !v.is_empty())
            .or_else(|| invitation_venue(note));

        let year = ["pdate", "cdate"]
            .iter()
            .filter_map(|key| note.get(*key).and_then(Value::as_i64))
            .find_map(|ms| DateTime::from_timestamp_millis(ms).map(|dt| dt.year()))
            .or_else(|| venue.as_deref().and_then(extract_year));

        let entry_type = if venue.is_some() {
            EntryType::InProceedings
        } else {
            EntryType::Misc
        };

        let mut builder = MetadataBuilder::new(title, entry_type)
            .authors(authors)
            .year(year)
            .url(format!("{}?id={}", OPENREVIEW_FORUM_URL, id))
            .note(format!("OpenReview ID: {}", id));
        if let Some(venue) = venue {
            builder = builder.venue(venue);
        }

        builder.build().ensure_usable()
    }
}

/// Content field, unwrapping the API v2 `{"value": ...}` shape
fn content_value<'a>(content: &'a Value, key: &str) -> Option<&'a Value> {
    let field = content.get(key)?;
    match field.get("value") {
        Some(inner) => Some(inner),
        None => Some(field),
    }
}

/// Venue derived from `invitation` (v1) or the first of `invitations` (v2)
fn invitation_venue(note: &Value) -> Option<String> {
    let invitation = note.get("invitation").and_then(Value::as_str).or_else(|| {
        note.get("invitations")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(Value::as_str)
    })?;

    INVITATION_VENUE_RE
        .captures(invitation)
        .map(|caps| caps[1].to_string())
}

#[async_trait]
impl Handler for OpenReviewHandler {
    fn id(&self) -> &str {
        "openreview"
    }

    fn name(&self) -> &str {
        "OpenReview"
    }

    fn description(&self) -> &str {
        "OpenReview forum and PDF links, resolved through the OpenReview notes API"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_id(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let id = Self::extract_id(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not an OpenReview URL: {}", url)))?;

        let api_url = format!("{}/notes?id={}", self.api_url, urlencoding::encode(&id));
        debug!("Fetching OpenReview note {}", id);

        let data: Value = self.client.fetch_json(&api_url, &[]).await?;
        let note = data
            .get("notes")
            .and_then(Value::as_array)
            .and_then(|notes| notes.first())
            .ok_or_else(|| HandlerError::Parse(format!("No OpenReview note found with ID {}", id)))?;

        Self::build_metadata(&id, note)
    }
}

//! arXiv handler.
//!
//! Recognizes abstract, PDF and HTML pages on arxiv.org and reads the record
//! from the arXiv Atom API.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};
use crate::utils::{extract_year, normalize_whitespace, HttpClient};

/// Canonical abstract page prefix
const ARXIV_ABS_URL: &str = "https://arxiv.org/abs";

/// New-style `YYMM.NNNNN` and legacy `archive/NNNNNNN` identifiers, with
/// optional version and `.pdf` suffixes
static ARXIV_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:www\.|export\.)?arxiv\.org/(?:abs|pdf|html)/(\d{4}\.\d{4,5}|[a-z][a-z.\-]*/\d{7})(?:v\d+)?(?:\.pdf)?/?(?:[?#].*)?$",
    )
    .unwrap()
});

/// arXiv handler
///
/// Queries `<api>/query?id_list=<id>` and reads title, authors, publication
/// year, primary category, DOI and journal reference from the Atom feed.
#[derive(Debug, Clone)]
pub struct ArxivHandler {
    client: Arc<HttpClient>,
    api_url: String,
}

impl ArxivHandler {
    /// Create a new arXiv handler
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self::with_base_url(client, &config.endpoints.arxiv_api)
    }

    /// Create with a custom API base URL (for testing)
    pub fn with_base_url(client: Arc<HttpClient>, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract the version-less arXiv ID from a URL
    ///
    /// Handles formats like:
    /// - "https://arxiv.org/abs/2103.15348"
    /// - "https://arxiv.org/pdf/2103.15348v2.pdf"
    /// - "http://arxiv.org/abs/hep-th/9711200"
    pub fn extract_id(url: &str) -> Option<String> {
        ARXIV_URL_RE
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn build_metadata(id: &str, entry: AtomEntry) -> Metadata {
        let mut builder = MetadataBuilder::new(normalize_whitespace(&entry.title), EntryType::Article)
            .authors(entry.authors.iter().map(|a| normalize_whitespace(a)))
            .year(extract_year(&entry.published))
            .venue(format!("arXiv preprint arXiv:{}", id))
            .arxiv_id(id)
            .url(format!("{}/{}", ARXIV_ABS_URL, id))
            .primary_class(entry.primary_category)
            .note(normalize_whitespace(&entry.journal_ref));

        if !entry.doi.trim().is_empty() {
            builder = builder.doi(entry.doi);
        }

        builder.build()
    }
}

#[async_trait]
impl Handler for ArxivHandler {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn description(&self) -> &str {
        "arXiv abstract, PDF and HTML pages, resolved through the arXiv Atom API"
    }

    fn recognize(&self, url: &str) -> bool {
        Self::extract_id(url).is_some()
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let id = Self::extract_id(url)
            .ok_or_else(|| HandlerError::Parse(format!("Not an arXiv URL: {}", url)))?;

        let api_url = format!(
            "{}/query?id_list={}",
            self.api_url,
            urlencoding::encode(&id)
        );
        debug!("Fetching arXiv record {}", id);

        let response = self
            .client
            .fetch_text(&api_url, Some("application/atom+xml"), &[])
            .await?;

        let entry = parse_atom(&response.body)?
            .ok_or_else(|| HandlerError::Parse(format!("No arXiv entry found for {}", id)))?;

        if entry.id.contains("/api/errors") {
            return Err(HandlerError::Parse(format!(
                "arXiv API error for {}: {}",
                id,
                normalize_whitespace(&entry.summary)
            )));
        }

        Self::build_metadata(&id, entry).ensure_usable()
    }
}

/// Fields of the first `<entry>` in an arXiv Atom feed
#[derive(Debug, Default)]
struct AtomEntry {
    id: String,
    title: String,
    summary: String,
    authors: Vec<String>,
    published: String,
    doi: String,
    journal_ref: String,
    primary_category: String,
}

/// Parse the first entry of an Atom feed; `None` when the feed is empty
fn parse_atom(xml: &str) -> Result<Option<AtomEntry>, HandlerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entry: Option<AtomEntry> = None;
    // Local names of the open elements below <entry>
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                if entry.is_none() && name == "entry" {
                    entry = Some(AtomEntry::default());
                    path.clear();
                } else if let Some(current) = entry.as_mut() {
                    if name == "author" && path.is_empty() {
                        current.authors.push(String::new());
                    }
                    if name == "primary_category" {
                        current.primary_category = get_attr(&e, "term").unwrap_or_default();
                    }
                    path.push(name);
                }
            }
            Event::Empty(e) => {
                if let Some(current) = entry.as_mut() {
                    if local_name(&e) == "primary_category" {
                        current.primary_category = get_attr(&e, "term").unwrap_or_default();
                    }
                }
            }
            Event::Text(e) => {
                if let Some(current) = entry.as_mut() {
                    let text = e.unescape()?;
                    let target = match path.iter().map(String::as_str).collect::<Vec<_>>()[..] {
                        ["id"] => Some(&mut current.id),
                        ["title"] => Some(&mut current.title),
                        ["summary"] => Some(&mut current.summary),
                        ["published"] => Some(&mut current.published),
                        ["doi"] => Some(&mut current.doi),
                        ["journal_ref"] => Some(&mut current.journal_ref),
                        ["author", "name"] => current.authors.last_mut(),
                        _ => None,
                    };
                    if let Some(target) = target {
                        if !target.is_empty() {
                            target.push(' ');
                        }
                        target.push_str(&text);
                    }
                }
            }
            Event::End(e) => {
                if entry.is_some() {
                    if path.is_empty() && e.local_name().as_ref() == b"entry" {
                        return Ok(entry);
                    }
                    path.pop();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entry)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Get attribute value from XML element
fn get_attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::format_entry;
    use mockito::Matcher;

    const SWIN_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=&amp;id_list=2103.15348</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2103.15348v2</id>
    <updated>2021-06-21T17:50:02Z</updated>
    <published>2021-03-29T17:31:50Z</published>
    <title>LayoutParser: A Unified Toolkit for Deep Learning Based Document
  Image Analysis</title>
    <summary>Recent advances in document image analysis.</summary>
    <author>
      <name>Zejiang Shen</name>
    </author>
    <author>
      <name>Ruochen Zhang</name>
    </author>
    <author>
      <name>Melissa Dell</name>
    </author>
    <arxiv:doi xmlns:arxiv="http://arxiv.org/schema/2008/an">10.1007/978-3-030-86549-8_9</arxiv:doi>
    <arxiv:journal_ref xmlns:arxiv="http://arxiv.org/schema/2008/an">ICDAR 2021</arxiv:journal_ref>
    <link href="http://arxiv.org/abs/2103.15348v2" rel="alternate" type="text/html"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schema/2008/an" term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=&amp;id_list=9999.99999</title>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_9999.99999</id>
    <title>Error</title>
    <summary>incorrect id format for 9999.99999</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_extract_id() {
        assert_eq!(
            ArxivHandler::extract_id("https://arxiv.org/abs/2103.15348"),
            Some("2103.15348".to_string())
        );
        assert_eq!(
            ArxivHandler::extract_id("https://arxiv.org/pdf/2103.15348v2.pdf"),
            Some("2103.15348".to_string())
        );
        assert_eq!(
            ArxivHandler::extract_id("https://arxiv.org/html/2401.00001v1"),
            Some("2401.00001".to_string())
        );
        assert_eq!(
            ArxivHandler::extract_id("http://arxiv.org/abs/hep-th/9711200v3"),
            Some("hep-th/9711200".to_string())
        );
        assert_eq!(
            ArxivHandler::extract_id("https://www.arxiv.org/abs/1706.03762#"),
            Some("1706.03762".to_string())
        );
    }

    #[test]
    fn test_recognize_rejects_other_urls() {
        let handler = ArxivHandler::with_base_url(Arc::new(HttpClient::new()), "http://localhost");
        assert!(!handler.recognize("https://arxiv.org/list/cs.CV/recent"));
        assert!(!handler.recognize("https://example.com/abs/2103.15348"));
        assert!(!handler.recognize("not a url"));
        assert!(handler.recognize("arxiv.org/abs/2103.15348"));
        assert!(handler.recognize("HTTPS://arXiv.org/pdf/2103.15348"));
        assert!(!handler.recognize(""));
    }

    #[test]
    fn test_parse_atom_entry() {
        let entry = parse_atom(SWIN_FEED).unwrap().unwrap();
        assert_eq!(entry.id, "http://arxiv.org/abs/2103.15348v2");
        assert_eq!(
            normalize_whitespace(&entry.title),
            "LayoutParser: A Unified Toolkit for Deep Learning Based Document Image Analysis"
        );
        assert_eq!(entry.authors, vec!["Zejiang Shen", "Ruochen Zhang", "Melissa Dell"]);
        assert_eq!(entry.primary_category, "cs.CV");
        assert_eq!(entry.doi, "10.1007/978-3-030-86549-8_9");
        assert_eq!(entry.journal_ref, "ICDAR 2021");
    }

    #[test]
    fn test_parse_empty_feed() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom(feed).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_extract_with_mock_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded(
                "id_list".to_string(),
                "2103.15348".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(SWIN_FEED)
            .create_async()
            .await;

        let handler = ArxivHandler::with_base_url(Arc::new(HttpClient::new()), &server.url());
        let metadata = handler
            .extract("https://arxiv.org/abs/2103.15348v2")
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(metadata.entry_type, EntryType::Article);
        assert_eq!(metadata.year, Some(2021));
        assert_eq!(metadata.arxiv_id(), Some("2103.15348"));
        assert_eq!(metadata.url(), Some("https://arxiv.org/abs/2103.15348"));
        assert_eq!(
            metadata.venue.as_deref(),
            Some("arXiv preprint arXiv:2103.15348")
        );

        let bibtex = format_entry(&metadata);
        assert!(bibtex.starts_with("@article{shen2021,"));
        assert!(bibtex.contains("eprint = {2103.15348}"));
        assert!(bibtex.contains("archivePrefix = {arXiv}"));
        assert!(bibtex.contains("primaryClass = {cs.CV}"));
    }

    #[tokio::test]
    async fn test_api_error_entry_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ERROR_FEED)
            .create_async()
            .await;

        let handler = ArxivHandler::with_base_url(Arc::new(HttpClient::new()), &server.url());
        let err = handler
            .extract("https://arxiv.org/abs/9999.99999")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Parse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let handler = ArxivHandler::with_base_url(Arc::new(HttpClient::new()), &server.url());
        let err = handler
            .extract("https://arxiv.org/abs/2103.15348")
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Fetch(_)));
    }
}

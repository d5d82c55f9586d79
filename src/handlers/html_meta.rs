//! Generic fallback over HTML citation meta tags.
//!
//! Publisher pages describe themselves with three families of meta tags:
//! Highwire/Google Scholar `citation_*`, Dublin Core `DC.*`/`dcterms.*` and
//! Open Graph `og:*`/`article:*`. A bare `author` tag is the last resort for
//! authors. Each field has its own rule listing the families in precedence
//! order; the first family with a non-empty value for that field wins,
//! independently of the other fields.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};
use crate::utils::{clean_doi, extract_year, normalize_whitespace, HttpClient};

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[content]").unwrap());

/// Tag names per family, highest precedence first
type Rule = &'static [&'static [&'static str]];

const TITLE: Rule = &[
    &["citation_title"],
    &["dc.title", "dcterms.title"],
    &["og:title"],
];
const AUTHORS: Rule = &[
    &["citation_author"],
    &["dc.creator", "dcterms.creator"],
    &["author"],
];
const DATE: Rule = &[
    &["citation_publication_date", "citation_date", "citation_online_date"],
    &["dc.date", "dcterms.issued", "dcterms.date"],
    &["article:published_time"],
];
const JOURNAL: Rule = &[&["citation_journal_title"], &["dc.source", "dcterms.source"]];
const CONFERENCE: Rule = &[&["citation_conference_title"]];
const PUBLISHER: Rule = &[
    &["citation_publisher"],
    &["dc.publisher", "dcterms.publisher"],
    &["og:site_name"],
];
const VOLUME: Rule = &[&["citation_volume"]];
const ISSUE: Rule = &[&["citation_issue"]];
const FIRST_PAGE: Rule = &[&["citation_firstpage"]];
const LAST_PAGE: Rule = &[&["citation_lastpage"]];
const DOI: Rule = &[
    &["citation_doi"],
    &["dc.identifier.doi", "dc.identifier", "dcterms.identifier"],
];

const ALL_RULES: &[Rule] = &[
    TITLE, AUTHORS, DATE, JOURNAL, CONFERENCE, PUBLISHER, VOLUME, ISSUE, FIRST_PAGE, LAST_PAGE,
    DOI,
];

/// Meta tags of a page, names lowercased, in document order
#[derive(Debug, Default)]
struct MetaTags(Vec<(String, String)>);

impl MetaTags {
    fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let tags = document
            .select(&META_SELECTOR)
            .filter_map(|el| {
                let element = el.value();
                let name = element.attr("name").or_else(|| element.attr("property"))?;
                let content = normalize_whitespace(element.attr("content")?);
                if content.is_empty() {
                    None
                } else {
                    Some((name.trim().to_ascii_lowercase(), content))
                }
            })
            .collect();
        Self(tags)
    }

    fn values<'a>(&'a self, family: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(name, _)| family.contains(&name.as_str()))
            .map(|(_, content)| content.as_str())
    }

    /// First accepted value from the highest-precedence family that has one
    fn first_with<T, F>(&self, rule: Rule, accept: F) -> Option<T>
    where
        F: Fn(&str) -> Option<T>,
    {
        rule.iter()
            .find_map(|family| self.values(family).find_map(&accept))
    }

    fn first(&self, rule: Rule) -> Option<String> {
        self.first_with(rule, |v| Some(v.to_string()))
    }

    /// All values of the highest-precedence family that has any
    fn all(&self, rule: Rule) -> Vec<String> {
        rule.iter()
            .map(|family| self.values(family).map(str::to_string).collect::<Vec<_>>())
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }

    fn matches_any_rule(&self) -> bool {
        ALL_RULES
            .iter()
            .flat_map(|rule| rule.iter())
            .any(|family| self.values(family).next().is_some())
    }
}

/// HTML meta tag handler (fallback)
#[derive(Debug, Clone)]
pub struct HtmlMetaHandler {
    client: Arc<HttpClient>,
}

impl HtmlMetaHandler {
    /// Create a new HTML meta tag handler
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Build metadata from a page's meta tags
    pub fn parse_page(html: &str, page_url: &str) -> Result<Metadata, HandlerError> {
        let tags = MetaTags::parse(html);
        if !tags.matches_any_rule() {
            return Err(HandlerError::Parse(format!(
                "No citation meta tags found on {}",
                page_url
            )));
        }

        let journal = tags.first(JOURNAL);
        let conference = tags.first(CONFERENCE);
        let entry_type = if journal.is_some() {
            EntryType::Article
        } else if conference.is_some() {
            EntryType::InProceedings
        } else {
            EntryType::Misc
        };

        let pages = match (tags.first(FIRST_PAGE), tags.first(LAST_PAGE)) {
            (Some(first), Some(last)) if first != last => format!("{}--{}", first, last),
            (Some(first), _) => first,
            _ => String::new(),
        };

        let mut builder = MetadataBuilder::new(tags.first(TITLE).unwrap_or_default(), entry_type)
            .authors(tags.all(AUTHORS))
            .year(tags.first_with(DATE, extract_year))
            .publisher(tags.first(PUBLISHER).unwrap_or_default())
            .volume(tags.first(VOLUME).unwrap_or_default())
            .number(tags.first(ISSUE).unwrap_or_default())
            .pages(pages)
            .doi(tags.first_with(DOI, clean_doi).unwrap_or_default())
            .url(page_url);

        if let Some(venue) = journal.or(conference) {
            builder = builder.venue(venue);
        }

        builder.build().ensure_usable()
    }
}

#[async_trait]
impl Handler for HtmlMetaHandler {
    fn id(&self) -> &str {
        "html_meta"
    }

    fn name(&self) -> &str {
        "HTML Meta Tags"
    }

    fn description(&self) -> &str {
        "Fallback for any http(s) page using citation_*, Dublin Core and Open Graph meta tags"
    }

    fn recognize(&self, url: &str) -> bool {
        url::Url::parse(url.trim())
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        let page = self
            .client
            .fetch_text(url.trim(), Some("text/html"), &[])
            .await?;
        debug!("Scanning meta tags of {}", url);
        Self::parse_page(&page.body, url.trim())
    }
}

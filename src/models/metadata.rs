//! Metadata model representing a citable work from any handler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::handlers::HandlerError;

/// BibTeX entry type of a citable work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Article,
    InProceedings,
    InCollection,
    Book,
    TechReport,
    PhdThesis,
    Unpublished,
    Misc,
    Software,
}

impl EntryType {
    /// Returns the BibTeX name of the entry type (used after `@`)
    pub fn name(&self) -> &'static str {
        match self {
            EntryType::Article => "article",
            EntryType::InProceedings => "inproceedings",
            EntryType::InCollection => "incollection",
            EntryType::Book => "book",
            EntryType::TechReport => "techreport",
            EntryType::PhdThesis => "phdthesis",
            EntryType::Unpublished => "unpublished",
            EntryType::Misc => "misc",
            EntryType::Software => "software",
        }
    }

    /// Map a BibTeX/BibLaTeX entry type name onto the model.
    ///
    /// Returns `None` for types the model does not know, so callers can pick
    /// their own default.
    pub fn from_bibtex_name(name: &str) -> Option<Self> {
        let entry_type = match name.trim().to_ascii_lowercase().as_str() {
            "article" => EntryType::Article,
            "inproceedings" | "conference" => EntryType::InProceedings,
            "incollection" | "inbook" => EntryType::InCollection,
            "book" => EntryType::Book,
            "techreport" | "report" => EntryType::TechReport,
            "phdthesis" | "mastersthesis" | "thesis" => EntryType::PhdThesis,
            "unpublished" => EntryType::Unpublished,
            "misc" | "online" | "electronic" | "dataset" => EntryType::Misc,
            "software" => EntryType::Software,
            _ => return None,
        };
        Some(entry_type)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kinds of identifiers a work can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Doi,
    Arxiv,
    Url,
}

impl IdentifierKind {
    /// Returns the identifier kind name
    pub fn name(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "doi",
            IdentifierKind::Arxiv => "arxiv",
            IdentifierKind::Url => "url",
        }
    }
}

/// Normalized metadata of a citable work
///
/// Every handler produces one of these; the BibTeX formatter renders it.
/// Optional fields that a source does not provide are simply left empty and
/// omitted from the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Title of the work
    pub title: String,

    /// Authors in "First Last" form, in citation order
    pub authors: Vec<String>,

    /// Publication year
    pub year: Option<i32>,

    /// Journal, proceedings or other venue
    pub venue: Option<String>,

    /// Identifiers (DOI, arXiv ID, canonical URL)
    pub identifiers: BTreeMap<IdentifierKind, String>,

    /// BibTeX entry type
    pub entry_type: EntryType,

    /// Publisher or hosting organisation
    pub publisher: Option<String>,

    /// Journal volume
    pub volume: Option<String>,

    /// Journal issue number
    pub number: Option<String>,

    /// Page range
    pub pages: Option<String>,

    /// Software version
    pub version: Option<String>,

    /// arXiv primary subject class (e.g. "cs.CV")
    pub primary_class: Option<String>,

    /// Free-form note
    pub note: Option<String>,
}

impl Metadata {
    /// Create metadata with a title and entry type
    pub fn new(title: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            title: title.into(),
            entry_type,
            ..Self::default()
        }
    }

    /// Get an identifier by kind
    pub fn identifier(&self, kind: IdentifierKind) -> Option<&str> {
        self.identifiers.get(&kind).map(|s| s.as_str())
    }

    /// DOI, if known
    pub fn doi(&self) -> Option<&str> {
        self.identifier(IdentifierKind::Doi)
    }

    /// arXiv ID, if known
    pub fn arxiv_id(&self) -> Option<&str> {
        self.identifier(IdentifierKind::Arxiv)
    }

    /// Canonical URL, if known
    pub fn url(&self) -> Option<&str> {
        self.identifier(IdentifierKind::Url)
    }

    /// Whether this metadata is enough to cite: a title plus at least one
    /// author or identifier.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && (!self.authors.is_empty() || !self.identifiers.is_empty())
    }

    /// Fail with a parse error unless the metadata is usable
    pub fn ensure_usable(self) -> Result<Self, HandlerError> {
        if self.title.trim().is_empty() {
            return Err(HandlerError::Parse("No title found".to_string()));
        }
        if !self.is_usable() {
            return Err(HandlerError::Parse(format!(
                "No authors or identifiers found for '{}'",
                self.title
            )));
        }
        Ok(self)
    }
}

/// Builder for constructing Metadata objects
///
/// Empty strings passed to the optional setters are ignored, so handlers can
/// feed raw upstream values without checking each one.
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    metadata: Metadata,
}

impl MetadataBuilder {
    /// Create a new builder with required fields
    pub fn new(title: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            metadata: Metadata::new(title, entry_type),
        }
    }

    /// Set authors, dropping blank names
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.authors = authors
            .into_iter()
            .map(Into::into)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    /// Append a single author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        let author = author.trim();
        if !author.is_empty() {
            self.metadata.authors.push(author.to_string());
        }
        self
    }

    /// Set publication year
    pub fn year(mut self, year: Option<i32>) -> Self {
        self.metadata.year = year;
        self
    }

    /// Set venue
    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.metadata.venue = non_empty(venue.into());
        self
    }

    /// Add an identifier
    pub fn identifier(mut self, kind: IdentifierKind, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = value.trim();
        if !value.is_empty() {
            self.metadata.identifiers.insert(kind, value.to_string());
        }
        self
    }

    /// Set DOI
    pub fn doi(self, doi: impl Into<String>) -> Self {
        self.identifier(IdentifierKind::Doi, doi)
    }

    /// Set arXiv ID
    pub fn arxiv_id(self, id: impl Into<String>) -> Self {
        self.identifier(IdentifierKind::Arxiv, id)
    }

    /// Set canonical URL
    pub fn url(self, url: impl Into<String>) -> Self {
        self.identifier(IdentifierKind::Url, url)
    }

    /// Set publisher
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.metadata.publisher = non_empty(publisher.into());
        self
    }

    /// Set volume
    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.metadata.volume = non_empty(volume.into());
        self
    }

    /// Set issue number
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.metadata.number = non_empty(number.into());
        self
    }

    /// Set page range
    pub fn pages(mut self, pages: impl Into<String>) -> Self {
        self.metadata.pages = non_empty(pages.into());
        self
    }

    /// Set software version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.metadata.version = non_empty(version.into());
        self
    }

    /// Set arXiv primary class
    pub fn primary_class(mut self, class: impl Into<String>) -> Self {
        self.metadata.primary_class = non_empty(class.into());
        self
    }

    /// Set note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.metadata.note = non_empty(note.into());
        self
    }

    /// Build the Metadata
    pub fn build(self) -> Metadata {
        self.metadata
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let metadata = MetadataBuilder::new("Test Paper", EntryType::Article)
            .authors(["John Doe", " ", "Jane Smith"])
            .year(Some(2021))
            .venue("Nature")
            .doi("10.1234/test.1234")
            .pages("")
            .build();

        assert_eq!(metadata.title, "Test Paper");
        assert_eq!(metadata.authors, vec!["John Doe", "Jane Smith"]);
        assert_eq!(metadata.year, Some(2021));
        assert_eq!(metadata.venue.as_deref(), Some("Nature"));
        assert_eq!(metadata.doi(), Some("10.1234/test.1234"));
        assert!(metadata.pages.is_none());
    }

    #[test]
    fn test_usable_requires_title() {
        let metadata = MetadataBuilder::new("  ", EntryType::Misc)
            .author("John Doe")
            .build();
        assert!(!metadata.is_usable());
        assert!(matches!(
            metadata.ensure_usable(),
            Err(HandlerError::Parse(_))
        ));
    }

    #[test]
    fn test_usable_with_identifier_only() {
        let metadata = MetadataBuilder::new("Untitled Dataset", EntryType::Misc)
            .url("https://example.com/data")
            .build();
        assert!(metadata.is_usable());

        let bare = Metadata::new("Lonely Title", EntryType::Misc);
        assert!(!bare.is_usable());
        assert!(bare.ensure_usable().is_err());
    }

    #[test]
    fn test_entry_type_from_bibtex_name() {
        assert_eq!(
            EntryType::from_bibtex_name("ARTICLE"),
            Some(EntryType::Article)
        );
        assert_eq!(
            EntryType::from_bibtex_name("conference"),
            Some(EntryType::InProceedings)
        );
        assert_eq!(EntryType::from_bibtex_name("dataset"), Some(EntryType::Misc));
        assert_eq!(EntryType::from_bibtex_name("patent"), None);
        assert_eq!(EntryType::Software.to_string(), "software");
    }
}

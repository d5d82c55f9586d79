//! Reading BibTeX produced by upstream services.
//!
//! DOI resolvers, the ACL Anthology and `bib=` URL parameters already hand
//! out BibTeX. Rather than passing it through, the first entry is read into
//! [`Metadata`] so every handler's output is rendered by the same formatter.

use biblatex::{Bibliography, Chunk, Entry, Spanned};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::handlers::HandlerError;
use crate::models::{EntryType, IdentifierKind, Metadata, MetadataBuilder};
use crate::utils::{extract_year, normalize_whitespace};

static ENTRY_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*([A-Za-z]+)\s*[{(]").unwrap());

static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+").unwrap());

/// Fields tried, in order, for the venue
const VENUE_FIELDS: &[&str] = &[
    "journal",
    "journaltitle",
    "booktitle",
    "howpublished",
    "school",
    "institution",
    "series",
];

/// Read the first entry of a BibTeX document into metadata.
///
/// The entry type is taken from the source when the model knows it, and
/// falls back to `default_type` otherwise. Whitespace in every value is
/// collapsed. Fails with [`HandlerError::Parse`] when the document holds no
/// entry or the entry lacks a title.
pub fn parse_entry(src: &str, default_type: EntryType) -> Result<Metadata, HandlerError> {
    let bibliography = Bibliography::parse(src)
        .map_err(|e| HandlerError::Parse(format!("BibTeX: {}", e)))?;

    let entry = bibliography
        .iter()
        .next()
        .ok_or_else(|| HandlerError::Parse("No BibTeX entry found".to_string()))?;

    let entry_type = raw_entry_type(src)
        .and_then(|name| EntryType::from_bibtex_name(&name))
        .unwrap_or(default_type);

    let title = field(entry, "title").unwrap_or_default();
    let mut builder = MetadataBuilder::new(title, entry_type)
        .authors(field(entry, "author").map(|a| split_authors(&a)).unwrap_or_default())
        .year(
            field(entry, "year")
                .or_else(|| field(entry, "date"))
                .and_then(|y| extract_year(&y)),
        );

    if let Some(venue) = VENUE_FIELDS.iter().find_map(|name| field(entry, name)) {
        builder = builder.venue(venue);
    }

    builder = builder
        .publisher(field(entry, "publisher").unwrap_or_default())
        .volume(field(entry, "volume").unwrap_or_default())
        .number(
            field(entry, "number")
                .or_else(|| field(entry, "issue"))
                .unwrap_or_default(),
        )
        .pages(field(entry, "pages").unwrap_or_default())
        .version(field(entry, "version").unwrap_or_default())
        .primary_class(field(entry, "primaryclass").unwrap_or_default())
        .note(field(entry, "note").unwrap_or_default());

    if let Some(doi) = field(entry, "doi") {
        builder = builder.identifier(IdentifierKind::Doi, doi);
    }
    if let Some(url) = field(entry, "url") {
        builder = builder.url(url);
    }
    if let Some(eprint) = field(entry, "eprint") {
        let archive = field(entry, "archiveprefix")
            .or_else(|| field(entry, "eprinttype"))
            .unwrap_or_default();
        if archive.eq_ignore_ascii_case("arxiv") {
            builder = builder.arxiv_id(eprint);
        }
    }

    builder.build().ensure_usable()
}

/// Name after the first `@` that starts a real entry
fn raw_entry_type(src: &str) -> Option<String> {
    ENTRY_TYPE_RE
        .captures_iter(src)
        .map(|caps| caps[1].to_string())
        .find(|name| {
            !matches!(
                name.to_ascii_lowercase().as_str(),
                "comment" | "string" | "preamble"
            )
        })
}

/// Case-insensitive field lookup; blank values count as absent
fn field(entry: &Entry, name: &str) -> Option<String> {
    entry
        .fields
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, chunks)| normalize_whitespace(&chunks_text(chunks)))
        .filter(|value| !value.is_empty())
}

/// Resolved text of a field value; math keeps its `$...$` source
fn chunks_text(chunks: &[Spanned<Chunk>]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        match &chunk.v {
            Chunk::Normal(text) | Chunk::Verbatim(text) => out.push_str(text),
            Chunk::Math(math) => {
                out.push('$');
                out.push_str(math);
                out.push('$');
            }
        }
    }
    out
}

/// Split a BibTeX author list into "First Last" names
fn split_authors(authors: &str) -> Vec<String> {
    AND_RE
        .split(authors)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("others"))
        .map(reorder_name)
        .collect()
}

/// "Last, First" and "Last, Jr, First" become "First Last" and "First Last Jr"
fn reorder_name(name: &str) -> String {
    let parts: Vec<&str> = name.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [last, first] if !first.is_empty() => format!("{} {}", first, last),
        [last, suffix, first] if !first.is_empty() => format!("{} {} {}", first, last, suffix),
        _ => name.to_string(),
    }
}

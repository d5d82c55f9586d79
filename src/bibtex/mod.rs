//! BibTeX rendering of [`Metadata`].
//!
//! [`format_entry`] is deterministic: the same metadata always yields the same
//! bytes. Field order is `title`, `author`, `year`, the entry-type specific
//! fields, `publisher`, the arXiv eprint fields, `doi`, `note` and finally
//! `url`. Free-text values are escaped with [`escape_bibtex`]; identifiers
//! are written verbatim.
//!
//! The [`parse`] submodule goes the other way, for upstreams that already
//! answer in BibTeX.

pub mod parse;

pub use parse::parse_entry;

use crate::models::{EntryType, Metadata};

/// Render metadata as a BibTeX entry
///
/// ```
/// use url_bibtex::bibtex::format_entry;
/// use url_bibtex::models::{EntryType, MetadataBuilder};
///
/// let metadata = MetadataBuilder::new("Attention Is All You Need", EntryType::InProceedings)
///     .authors(["Ashish Vaswani", "Noam Shazeer"])
///     .year(Some(2017))
///     .venue("Advances in Neural Information Processing Systems")
///     .build();
///
/// let bibtex = format_entry(&metadata);
/// assert!(bibtex.starts_with("@inproceedings{vaswani2017,"));
/// assert!(bibtex.contains("author = {Ashish Vaswani and Noam Shazeer}"));
/// ```
pub fn format_entry(metadata: &Metadata) -> String {
    let mut fields: Vec<(&str, String)> = Vec::new();

    fields.push(("title", escape_bibtex(&metadata.title)));

    if !metadata.authors.is_empty() {
        let authors = metadata
            .authors
            .iter()
            .map(|a| escape_bibtex(a))
            .collect::<Vec<_>>()
            .join(" and ");
        fields.push(("author", authors));
    }

    if let Some(year) = metadata.year {
        fields.push(("year", year.to_string()));
    }

    let venue = metadata.venue.as_deref().map(escape_bibtex);
    match metadata.entry_type {
        EntryType::Article => {
            push_opt(&mut fields, "journal", venue);
            push_opt(&mut fields, "volume", metadata.volume.clone());
            push_opt(&mut fields, "number", metadata.number.clone());
            push_opt(&mut fields, "pages", metadata.pages.clone());
        }
        EntryType::InProceedings | EntryType::InCollection => {
            push_opt(&mut fields, "booktitle", venue);
            push_opt(&mut fields, "volume", metadata.volume.clone());
            push_opt(&mut fields, "pages", metadata.pages.clone());
        }
        EntryType::Book => {
            push_opt(&mut fields, "series", venue);
            push_opt(&mut fields, "volume", metadata.volume.clone());
        }
        EntryType::TechReport => {
            push_opt(&mut fields, "institution", venue);
            push_opt(&mut fields, "number", metadata.number.clone());
        }
        EntryType::PhdThesis => {
            push_opt(&mut fields, "school", venue);
        }
        EntryType::Misc | EntryType::Unpublished => {
            push_opt(&mut fields, "howpublished", venue);
        }
        EntryType::Software => {
            push_opt(&mut fields, "version", metadata.version.clone());
            push_opt(&mut fields, "howpublished", venue);
        }
    }

    push_opt(
        &mut fields,
        "publisher",
        metadata.publisher.as_deref().map(escape_bibtex),
    );

    if let Some(arxiv_id) = metadata.arxiv_id() {
        fields.push(("eprint", arxiv_id.to_string()));
        fields.push(("archivePrefix", "arXiv".to_string()));
        push_opt(&mut fields, "primaryClass", metadata.primary_class.clone());
    }

    push_opt(&mut fields, "doi", metadata.doi().map(str::to_string));
    push_opt(&mut fields, "note", metadata.note.as_deref().map(escape_bibtex));
    push_opt(&mut fields, "url", metadata.url().map(str::to_string));

    let body = fields
        .iter()
        .map(|(name, value)| format!("  {} = {{{}}}", name, value))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "@{}{{{},\n{}\n}}",
        metadata.entry_type.name(),
        citation_key(metadata),
        body
    )
}

fn push_opt<'a>(fields: &mut Vec<(&'a str, String)>, name: &'a str, value: Option<String>) {
    if let Some(value) = value {
        fields.push((name, value));
    }
}

/// Generate the citation key for an entry
///
/// `<first-author-surname><year>`, lowercased and reduced to alphanumerics.
/// Without authors the host of the URL (or the arXiv ID / DOI) stands in for
/// the surname; without a year the suffix is dropped.
pub fn citation_key(metadata: &Metadata) -> String {
    let base = metadata
        .authors
        .first()
        .map(|author| sanitize_key(surname(author)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback_key_base(metadata));

    match metadata.year {
        Some(year) => format!("{}{}", base, year),
        None => base,
    }
}

/// Surname of an author name in "First Last" or "Last, First" form
pub fn surname(author: &str) -> &str {
    match author.split_once(',') {
        Some((last, _)) => last.trim(),
        None => author.split_whitespace().last().unwrap_or(""),
    }
}

fn fallback_key_base(metadata: &Metadata) -> String {
    let from_host = metadata
        .url()
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| {
            u.host_str().and_then(|host| {
                host.split('.')
                    .find(|label| !label.is_empty() && *label != "www")
                    .map(sanitize_key)
            })
        })
        .filter(|s| !s.is_empty());

    from_host
        .or_else(|| metadata.arxiv_id().map(sanitize_key))
        .or_else(|| metadata.doi().map(sanitize_key))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "entry".to_string())
}

/// Lowercase ASCII letters and digits only; common Latin diacritics are folded
fn sanitize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.to_lowercase().chars() {
        match fold_latin(c) {
            Some(folded) => key.push_str(folded),
            None if c.is_ascii_alphanumeric() => key.push(c),
            None => {}
        }
    }
    key
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

/// Escape a free-text value for BibTeX.
///
/// Backslashes, braces and the LaTeX specials `&`, `%`, `#` are escaped.
/// A `$...$` span with balanced braces is math and is copied unchanged; a
/// lone `$` is escaped.
pub fn escape_bibtex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('$') {
        escape_text_into(&mut out, &rest[..start]);
        let after = &rest[start + 1..];
        match after.find('$') {
            Some(end) if end > 0 && braces_balanced(&after[..end]) => {
                out.push('$');
                out.push_str(&after[..end]);
                out.push('$');
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("\\$");
                rest = after;
            }
        }
    }
    escape_text_into(&mut out, rest);
    out
}

fn escape_text_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '&' | '%' | '#' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

fn braces_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdentifierKind, MetadataBuilder};
    use biblatex::{Bibliography, ChunksExt};

    fn arxiv_metadata() -> Metadata {
        MetadataBuilder::new(
            "Swin Transformer: Hierarchical Vision Transformer using Shifted Windows",
            EntryType::Article,
        )
        .authors(["Ze Liu", "Yutong Lin", "Yue Cao"])
        .year(Some(2021))
        .venue("arXiv preprint arXiv:2103.14030")
        .arxiv_id("2103.14030")
        .primary_class("cs.CV")
        .url("https://arxiv.org/abs/2103.14030")
        .build()
    }

    #[test]
    fn test_format_arxiv_article() {
        let bibtex = format_entry(&arxiv_metadata());

        let expected = "@article{liu2021,\n  \
            title = {Swin Transformer: Hierarchical Vision Transformer using Shifted Windows},\n  \
            author = {Ze Liu and Yutong Lin and Yue Cao},\n  \
            year = {2021},\n  \
            journal = {arXiv preprint arXiv:2103.14030},\n  \
            eprint = {2103.14030},\n  \
            archivePrefix = {arXiv},\n  \
            primaryClass = {cs.CV},\n  \
            url = {https://arxiv.org/abs/2103.14030}\n}";
        assert_eq!(bibtex, expected);
    }

    #[test]
    fn test_format_is_idempotent() {
        let metadata = arxiv_metadata();
        assert_eq!(format_entry(&metadata), format_entry(&metadata));
    }

    #[test]
    fn test_round_trip_through_parser() {
        let metadata = arxiv_metadata();
        let bibtex = format_entry(&metadata);

        let bibliography = Bibliography::parse(&bibtex).unwrap();
        let entry = bibliography.iter().next().unwrap();

        assert_eq!(entry.key, "liu2021");
        assert!(entry.key.starts_with(&surname(&metadata.authors[0]).to_lowercase()));
        let title = entry.fields.get("title").unwrap().format_verbatim();
        assert_eq!(title, metadata.title);
    }

    #[test]
    fn test_empty_authors_and_year_fallback_key() {
        let metadata = MetadataBuilder::new("Some Web Page", EntryType::Misc)
            .url("https://www.example.com/page")
            .build();

        let bibtex = format_entry(&metadata);
        assert!(bibtex.starts_with("@misc{example,\n"));
        assert!(!bibtex.contains("author"));
        assert!(!bibtex.contains("year"));
        assert!(bibtex.ends_with("url = {https://www.example.com/page}\n}"));

        let bibliography = Bibliography::parse(&bibtex).unwrap();
        assert_eq!(bibliography.iter().count(), 1);
    }

    #[test]
    fn test_fallback_key_uses_identifier_without_url() {
        let mut metadata = MetadataBuilder::new("A Paper", EntryType::Article)
            .doi("10.1038/nature12373")
            .year(Some(2013))
            .build();
        assert_eq!(citation_key(&metadata), "101038nature123732013");

        metadata.identifiers.clear();
        metadata.identifiers.insert(IdentifierKind::Arxiv, "2103.15348".to_string());
        assert_eq!(citation_key(&metadata), "2103153482013");
    }

    #[test]
    fn test_key_from_last_first_author() {
        let metadata = MetadataBuilder::new("A Paper", EntryType::Article)
            .author("van der Berg, Anna")
            .year(Some(1999))
            .build();
        assert_eq!(citation_key(&metadata), "vanderberg1999");
    }

    #[test]
    fn test_key_strips_punctuation() {
        let metadata = MetadataBuilder::new("A Paper", EntryType::Article)
            .author("Conan O'Brien-Smith")
            .build();
        assert_eq!(citation_key(&metadata), "obriensmith");
    }

    #[test]
    fn test_escape_braces_and_backslashes() {
        assert_eq!(escape_bibtex("a {b} c"), "a \\{b\\} c");
        assert_eq!(escape_bibtex("C:\\path"), "C:\\textbackslash{}path");
        assert_eq!(escape_bibtex("plain"), "plain");
        assert_eq!(escape_bibtex("R&D at 100% #1"), "R\\&D at 100\\% \\#1");

        let metadata = MetadataBuilder::new("Sets {x} and \\alpha", EntryType::Misc)
            .author("Jane {Doe}")
            .build();
        let bibtex = format_entry(&metadata);
        assert!(bibtex.contains("title = {Sets \\{x\\} and \\textbackslash{}alpha}"));
        assert!(bibtex.contains("author = {Jane \\{Doe\\}}"));
    }

    #[test]
    fn test_math_spans_are_kept() {
        assert_eq!(escape_bibtex("$\\alpha$-Cells"), "$\\alpha$-Cells");
        assert_eq!(
            escape_bibtex("$O(n^{2})$ & more"),
            "$O(n^{2})$ \\& more"
        );
        assert_eq!(escape_bibtex("costs $5"), "costs \\$5");
        assert_eq!(escape_bibtex("$}$"), "\\$\\}\\$");
    }

    #[test]
    fn test_key_folds_diacritics_to_ascii() {
        let metadata = MetadataBuilder::new("A Paper", EntryType::Article)
            .author("Jürgen Müller")
            .year(Some(2020))
            .build();
        assert_eq!(citation_key(&metadata), "muller2020");

        let metadata = MetadataBuilder::new("A Paper", EntryType::Article)
            .author("张伟")
            .build();
        assert_eq!(citation_key(&metadata), "entry");
    }

    #[test]
    fn test_software_fields() {
        let metadata = MetadataBuilder::new("requests", EntryType::Software)
            .author("psf")
            .year(Some(2011))
            .version("2.31.0")
            .publisher("GitHub")
            .note("A simple, yet elegant, HTTP library.")
            .url("https://github.com/psf/requests")
            .build();

        let bibtex = format_entry(&metadata);
        assert!(bibtex.starts_with("@software{psf2011,"));
        let version_pos = bibtex.find("version = {2.31.0}").unwrap();
        let publisher_pos = bibtex.find("publisher = {GitHub}").unwrap();
        let url_pos = bibtex.find("url = {").unwrap();
        assert!(version_pos < publisher_pos);
        assert!(publisher_pos < url_pos);
    }

    #[test]
    fn test_inproceedings_uses_booktitle() {
        let metadata = MetadataBuilder::new("A Talk", EntryType::InProceedings)
            .author("Ada Lovelace")
            .venue("ICLR 2023")
            .build();
        let bibtex = format_entry(&metadata);
        assert!(bibtex.contains("booktitle = {ICLR 2023}"));
        assert!(!bibtex.contains("journal"));
    }
}

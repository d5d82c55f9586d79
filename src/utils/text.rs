//! Small text helpers shared by the handlers.

use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^0-9])([12][0-9]{3})(?:[^0-9]|$)").unwrap());

static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,9}/[^\s]+").unwrap());

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First standalone four-digit year (1000-2999) in a string
///
/// Works on ISO dates ("2013-07-31"), timestamps and free text ("ICLR 2023").
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pull a bare DOI out of a string such as "https://doi.org/10.1/x" or "doi:10.1/x"
pub fn clean_doi(text: &str) -> Option<String> {
    DOI_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(&['.', ',', ';', ')'][..]).to_string())
}

/// Parse an http(s) URL, assuming `https://` when the scheme is left out
pub fn parse_web_url(url: &str) -> Option<url::Url> {
    let url = url.trim();
    let parsed = if url.contains("://") {
        url::Url::parse(url)
    } else {
        url::Url::parse(&format!("https://{}", url))
    }
    .ok()?;

    matches!(parsed.scheme(), "http" | "https").then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Swin\n   Transformer:\tHierarchical "),
            "Swin Transformer: Hierarchical"
        );
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2013-07-31"), Some(2013));
        assert_eq!(extract_year("2021-03-29T17:31:50Z"), Some(2021));
        assert_eq!(extract_year("ICLR 2023 poster"), Some(2023));
        assert_eq!(extract_year("2023"), Some(2023));
        assert_eq!(extract_year("20230115"), None);
        assert_eq!(extract_year("n.d."), None);
    }

    #[test]
    fn test_parse_web_url() {
        let parsed = parse_web_url("github.com/psf/requests").unwrap();
        assert_eq!(parsed.as_str(), "https://github.com/psf/requests");

        let parsed = parse_web_url(" HTTP://Example.org/a ").unwrap();
        assert_eq!(parsed.scheme(), "http");
        assert_eq!(parsed.host_str(), Some("example.org"));

        assert!(parse_web_url("ftp://example.com/x").is_none());
        assert!(parse_web_url("").is_none());
    }

    #[test]
    fn test_clean_doi() {
        assert_eq!(
            clean_doi("https://doi.org/10.1038/nature12373"),
            Some("10.1038/nature12373".to_string())
        );
        assert_eq!(
            clean_doi("doi:10.1109/5.771073."),
            Some("10.1109/5.771073".to_string())
        );
        assert_eq!(clean_doi("no identifier here"), None);
    }
}

//! Ordered registry of URL handlers.

use std::sync::Arc;
use tracing::debug;

use super::{Handler, HandlerError};
use crate::config::Config;
use crate::models::HandlerDescriptor;
use crate::utils::HttpClient;

/// Ordered collection of handlers
///
/// Registration order is dispatch priority. The registry is built once at
/// start-up and only read afterwards; there is no way to remove a handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Create a registry with every compiled-in handler, in default order
    pub fn with_default_handlers(config: &Config) -> Result<Self, HandlerError> {
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        let mut registry = Self::new();

        #[cfg(feature = "handler-url-param")]
        registry.register(Arc::new(super::UrlParamHandler::new()));

        #[cfg(feature = "handler-arxiv")]
        registry.register(Arc::new(super::ArxivHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-doi")]
        registry.register(Arc::new(super::DoiHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-biorxiv")]
        registry.register(Arc::new(super::BiorxivHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-pii")]
        registry.register(Arc::new(super::PiiHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-openreview")]
        registry.register(Arc::new(super::OpenReviewHandler::new(
            client.clone(),
            config,
        )));

        #[cfg(feature = "handler-semantic")]
        registry.register(Arc::new(super::SemanticScholarHandler::new(
            client.clone(),
            config,
        )));

        #[cfg(feature = "handler-github")]
        registry.register(Arc::new(super::GithubHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-ieee")]
        registry.register(Arc::new(super::IeeeHandler::new(client.clone(), config)));

        #[cfg(feature = "handler-acl")]
        registry.register(Arc::new(super::AclAnthologyHandler::new(
            client.clone(),
            config,
        )));

        #[cfg(feature = "handler-html-meta")]
        registry.register(Arc::new(super::HtmlMetaHandler::new(client.clone())));

        // Unused when every network handler is compiled out
        drop(client);

        debug!("Registered {} handlers", registry.len());
        Ok(registry)
    }

    /// Append a handler; it gets the lowest priority so far
    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.push(handler);
    }

    /// First handler that recognizes the URL
    pub fn find_handler(&self, url: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.iter().find(|h| h.recognize(url))
    }

    /// Descriptors of all handlers, in dispatch order
    pub fn list_handlers(&self) -> Vec<HandlerDescriptor> {
        self.handlers.iter().map(|h| h.descriptor()).collect()
    }

    /// Iterate over handlers in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Handler>> {
        self.handlers.iter()
    }

    /// Get a handler by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.iter().find(|h| h.id() == id)
    }

    /// Get the number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::MockHandler;

    #[test]
    fn test_empty_registry_finds_nothing() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find_handler("https://arxiv.org/abs/2103.15348").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(MockHandler::new("first", "example.org")));
        registry.register(Arc::new(MockHandler::new("second", "example")));

        let handler = registry.find_handler("https://example.org/paper").unwrap();
        assert_eq!(handler.id(), "first");

        let handler = registry.find_handler("https://example.com/paper").unwrap();
        assert_eq!(handler.id(), "second");

        assert!(registry.find_handler("https://other.net/").is_none());
    }

    #[test]
    fn test_list_handlers_keeps_order() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(MockHandler::new("b", "b")));
        registry.register(Arc::new(MockHandler::new("a", "a")));
        registry.register(Arc::new(MockHandler::new("b", "b")));

        let ids: Vec<String> = registry.list_handlers().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "a", "b"]);
        assert_eq!(registry.len(), 3);
    }

    #[cfg(all(feature = "handler-arxiv", feature = "handler-html-meta"))]
    #[test]
    fn test_generic_fallback_must_be_last() {
        let config = Config::default();
        let client = Arc::new(HttpClient::new());
        let arxiv_url = "https://arxiv.org/abs/2103.15348";

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(crate::handlers::HtmlMetaHandler::new(client.clone())));
        registry.register(Arc::new(crate::handlers::ArxivHandler::new(
            client.clone(),
            &config,
        )));
        assert_eq!(registry.find_handler(arxiv_url).unwrap().id(), "html_meta");

        let registry = HandlerRegistry::with_default_handlers(&config).unwrap();
        assert_eq!(registry.find_handler(arxiv_url).unwrap().id(), "arxiv");
    }

    #[cfg(all(
        feature = "handler-url-param",
        feature = "handler-arxiv",
        feature = "handler-doi",
        feature = "handler-biorxiv",
        feature = "handler-pii",
        feature = "handler-openreview",
        feature = "handler-semantic",
        feature = "handler-github",
        feature = "handler-ieee",
        feature = "handler-acl",
        feature = "handler-html-meta"
    ))]
    #[test]
    fn test_default_order() {
        let registry = HandlerRegistry::with_default_handlers(&Config::default()).unwrap();
        let ids: Vec<&str> = registry.iter().map(|h| h.id()).collect();
        assert_eq!(
            ids,
            vec![
                "url_param",
                "arxiv",
                "doi",
                "biorxiv",
                "pii",
                "openreview",
                "semantic",
                "github",
                "ieee",
                "acl",
                "html_meta",
            ]
        );
        assert!(registry.get("github").is_some());
    }

    #[cfg(all(
        feature = "handler-url-param",
        feature = "handler-arxiv",
        feature = "handler-doi",
        feature = "handler-biorxiv",
        feature = "handler-pii",
        feature = "handler-openreview",
        feature = "handler-semantic",
        feature = "handler-github",
        feature = "handler-ieee",
        feature = "handler-acl",
        feature = "handler-html-meta"
    ))]
    #[test]
    fn test_arxiv_urls_only_match_arxiv() {
        let registry = HandlerRegistry::with_default_handlers(&Config::default()).unwrap();
        let urls = [
            "https://arxiv.org/abs/2103.15348",
            "https://arxiv.org/pdf/2103.15348v2.pdf",
            "http://arxiv.org/abs/hep-th/9711200",
        ];

        for url in urls {
            let specific: Vec<&str> = registry
                .iter()
                .filter(|h| h.id() != "html_meta" && h.recognize(url))
                .map(|h| h.id())
                .collect();
            assert_eq!(specific, vec!["arxiv"], "unexpected handlers for {}", url);
        }
    }

    #[cfg(all(
        feature = "handler-url-param",
        feature = "handler-arxiv",
        feature = "handler-doi",
        feature = "handler-biorxiv",
        feature = "handler-pii",
        feature = "handler-openreview",
        feature = "handler-semantic",
        feature = "handler-github",
        feature = "handler-ieee",
        feature = "handler-acl",
        feature = "handler-html-meta"
    ))]
    #[test]
    fn test_urls_without_scheme_reach_specific_handlers() {
        let registry = HandlerRegistry::with_default_handlers(&Config::default()).unwrap();
        let cases = [
            ("arxiv.org/abs/2103.15348", "arxiv"),
            ("github.com/psf/requests", "github"),
            ("openreview.net/forum?id=YicbFdNTTy", "openreview"),
            (
                "www.semanticscholar.org/paper/204e3073870fae3d05bcbc2f6a8e263d9b72e776",
                "semantic",
            ),
            ("doi.org/10.1038/nature12373", "doi"),
            ("aclanthology.org/N19-1423", "acl"),
        ];

        for (url, expected) in cases {
            let id = registry.find_handler(url).map(|h| h.id().to_string());
            assert_eq!(id.as_deref(), Some(expected), "wrong handler for {}", url);
        }

        assert!(registry.find_handler("example.com/page").is_none());
    }
}

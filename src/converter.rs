//! URL to BibTeX conversion.
//!
//! [`Converter`] is the entry point of the library: it picks the first
//! handler in its registry that recognizes a URL, lets that handler fetch the
//! record, and renders the result with [`format_entry`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bibtex::format_entry;
use crate::config::Config;
use crate::handlers::{ConvertError, Handler, HandlerError, HandlerRegistry};
use crate::models::{ConvertResponse, HandlerDescriptor, HealthResponse, Metadata};

/// Converts URLs to BibTeX using an ordered handler registry
///
/// Cheap to clone; clones share the same registry.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: Arc<HandlerRegistry>,
}

impl Converter {
    /// Create a converter over an existing registry
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Create a converter with every compiled-in handler
    pub fn with_default_handlers(config: &Config) -> Result<Self, HandlerError> {
        Ok(Self::new(HandlerRegistry::with_default_handlers(config)?))
    }

    /// The registry used for dispatch
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Handler that would process the URL
    pub fn handler_for(&self, url: &str) -> Option<&Arc<dyn Handler>> {
        self.registry.find_handler(url.trim())
    }

    /// Whether any registered handler recognizes the URL
    pub fn can_convert(&self, url: &str) -> bool {
        self.handler_for(url).is_some()
    }

    /// Extract metadata without rendering it
    ///
    /// Exactly one handler is invoked; its error is returned as is, without
    /// trying the handlers after it.
    pub async fn extract(&self, url: &str) -> Result<Metadata, ConvertError> {
        let url = url.trim();
        let handler = self
            .handler_for(url)
            .ok_or_else(|| ConvertError::NoHandler(url.to_string()))?;

        info!("Converting {} with {} handler", url, handler.id());
        let metadata = handler.extract(url).await.map_err(|e| {
            warn!("{} handler failed for {}: {}", handler.id(), url, e);
            ConvertError::from(e)
        })?;

        debug!(
            "Extracted '{}' ({} authors) from {}",
            metadata.title,
            metadata.authors.len(),
            url
        );
        Ok(metadata)
    }

    /// Convert a URL into a BibTeX entry
    pub async fn convert(&self, url: &str) -> Result<String, ConvertError> {
        let metadata = self.extract(url).await?;
        Ok(format_entry(&metadata))
    }

    /// Convert a URL, folding any error into the response
    pub async fn convert_response(&self, url: &str) -> ConvertResponse {
        match self.convert(url).await {
            Ok(bibtex) => ConvertResponse::success(url, bibtex),
            Err(e) => ConvertResponse::failure(url, e.to_string()),
        }
    }

    /// Registered handlers, in dispatch order
    pub fn list_handlers(&self) -> Vec<HandlerDescriptor> {
        self.registry.list_handlers()
    }

    /// Health summary
    pub fn health(&self) -> HealthResponse {
        let handlers = self.registry.len();
        HealthResponse {
            status: if handlers > 0 { "ok" } else { "degraded" }.to_string(),
            handlers,
        }
    }
}

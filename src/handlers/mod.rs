//! URL handlers with an extensible trait-based architecture.
//!
//! This module defines the [`Handler`] trait that every URL handler implements.
//! A handler decides whether it recognizes a URL (pure, no I/O) and, if it
//! does, fetches and parses the upstream record into [`Metadata`]. Handlers
//! are collected into a [`HandlerRegistry`], where registration order is
//! dispatch priority: the first handler that recognizes a URL wins.
//!
//! # Feature Flags
//!
//! Individual handlers can be disabled at compile time using Cargo features:
//!
//! - `url_param` - Inline BibTeX passed in a `bib=` query parameter (default: enabled)
//! - `arxiv` - arXiv abstract/PDF pages (default: enabled)
//! - `doi` - DOI links resolved by content negotiation (default: enabled)
//! - `biorxiv` - bioRxiv/medRxiv content pages (default: enabled, implies `doi`)
//! - `pii` - ScienceDirect and Cell Press PII links (default: enabled, implies `doi`)
//! - `openreview` - OpenReview forum pages (default: enabled)
//! - `semantic` - Semantic Scholar paper pages (default: enabled)
//! - `github` - GitHub repositories (default: enabled)
//! - `ieee` - IEEE Xplore documents (default: enabled, implies `doi`)
//! - `acl` - ACL Anthology papers (default: enabled)
//! - `html_meta` - Generic fallback over HTML meta tags (default: enabled)
//!
//! # Feature Groups
//!
//! - `core` - arxiv, doi, html_meta
//! - `preprints` - arxiv, biorxiv, openreview
//! - `full` - All handlers (default)
//!
//! # Dispatch Order
//!
//! [`HandlerRegistry::with_default_handlers`] registers the handlers in this
//! order, skipping any that were compiled out:
//!
//! 1. url_param
//! 2. arxiv
//! 3. doi
//! 4. biorxiv
//! 5. pii
//! 6. openreview
//! 7. semantic
//! 8. github
//! 9. ieee
//! 10. acl
//! 11. html_meta
//!
//! The generic `html_meta` handler recognizes every http(s) URL, so it must
//! stay last or it shadows everything registered after it.

#[cfg(feature = "handler-acl")]
mod acl;
#[cfg(feature = "handler-arxiv")]
mod arxiv;
#[cfg(feature = "handler-biorxiv")]
mod biorxiv;
#[cfg(feature = "handler-doi")]
mod doi;
#[cfg(feature = "handler-github")]
mod github;
#[cfg(feature = "handler-html-meta")]
mod html_meta;
#[cfg(feature = "handler-ieee")]
mod ieee;
#[cfg(feature = "handler-openreview")]
mod openreview;
#[cfg(feature = "handler-pii")]
mod pii;
mod registry;
#[cfg(feature = "handler-semantic")]
mod semantic;
#[cfg(feature = "handler-url-param")]
mod url_param;

pub mod mock;

pub use mock::MockHandler;
pub use registry::HandlerRegistry;

#[cfg(feature = "handler-acl")]
pub use acl::AclAnthologyHandler;
#[cfg(feature = "handler-arxiv")]
pub use arxiv::ArxivHandler;
#[cfg(feature = "handler-biorxiv")]
pub use biorxiv::BiorxivHandler;
#[cfg(feature = "handler-doi")]
pub use doi::DoiHandler;
#[cfg(feature = "handler-github")]
pub use github::GithubHandler;
#[cfg(feature = "handler-html-meta")]
pub use html_meta::HtmlMetaHandler;
#[cfg(feature = "handler-ieee")]
pub use ieee::IeeeHandler;
#[cfg(feature = "handler-openreview")]
pub use openreview::OpenReviewHandler;
#[cfg(feature = "handler-pii")]
pub use pii::PiiHandler;
#[cfg(feature = "handler-semantic")]
pub use semantic::SemanticScholarHandler;
#[cfg(feature = "handler-url-param")]
pub use url_param::UrlParamHandler;

use crate::models::{HandlerDescriptor, Metadata};
use async_trait::async_trait;

/// The Handler trait defines the interface for all URL handlers.
///
/// # Implementing a New Handler
///
/// To add a new handler:
///
/// 1. Create a new struct that implements `Handler`
/// 2. Keep `recognize` free of I/O; it runs for every URL until one matches
/// 3. Have `extract` return metadata that passes [`Metadata::ensure_usable`]
/// 4. Register it with [`HandlerRegistry::register`] ahead of the generic
///    fallback, or add it to `HandlerRegistry::with_default_handlers()`
#[async_trait]
pub trait Handler: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this handler (e.g., "arxiv", "doi")
    fn id(&self) -> &str;

    /// Human-readable name of this handler
    fn name(&self) -> &str;

    /// What URLs the handler accepts and where it gets metadata from
    fn description(&self) -> &str;

    /// Whether this handler can process the URL.
    ///
    /// Must not perform I/O and must return `false` (never panic) on
    /// malformed input.
    fn recognize(&self, url: &str) -> bool;

    /// Fetch and parse the record behind the URL
    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError>;

    /// Descriptor used by handler listings
    fn descriptor(&self) -> HandlerDescriptor {
        HandlerDescriptor {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Errors that can occur inside a handler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// Network failure or non-success HTTP status
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Upstream answered but no usable metadata could be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for HandlerError {
    fn from(err: reqwest::Error) -> Self {
        HandlerError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for HandlerError {
    fn from(err: quick_xml::Error) -> Self {
        HandlerError::Parse(format!("XML: {}", err))
    }
}

impl From<serde_yaml::Error> for HandlerError {
    fn from(err: serde_yaml::Error) -> Self {
        HandlerError::Parse(format!("YAML: {}", err))
    }
}

/// Errors returned by [`crate::Converter`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// No registered handler recognizes the URL
    #[error("No handler found for URL: {0}")]
    NoHandler(String),

    /// The chosen handler could not fetch the record
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The chosen handler could not parse usable metadata
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<HandlerError> for ConvertError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Fetch(msg) => ConvertError::Fetch(msg),
            HandlerError::Parse(msg) => ConvertError::Parse(msg),
        }
    }
}

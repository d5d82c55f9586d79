//! # url-bibtex
//!
//! Converts URLs of papers, preprints and software repositories into BibTeX
//! entries. Each supported site is covered by a handler that recognizes its
//! URLs and extracts citation metadata from the site's API or pages; a
//! generic handler reads HTML citation meta tags for everything else.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Citation metadata and response shapes
//! - [`handlers`]: URL handlers with an extensible trait-based architecture
//! - [`bibtex`]: BibTeX rendering and reading
//! - [`converter`]: URL dispatch and conversion
//! - [`mcp`]: MCP protocol implementation and server
//! - [`utils`]: HTTP client and text helpers
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```no_run
//! use url_bibtex::{Config, Converter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::with_default_handlers(&Config::default())?;
//! let bibtex = converter.convert("https://arxiv.org/abs/2103.15348").await?;
//! println!("{}", bibtex);
//! # Ok(())
//! # }
//! ```

pub mod bibtex;
pub mod config;
pub mod converter;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use converter::Converter;
pub use handlers::{ConvertError, Handler, HandlerError, HandlerRegistry};
pub use models::{EntryType, Metadata};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

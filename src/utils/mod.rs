//! Utility modules supporting the handlers.
//!
//! - [`HttpClient`]: shared `reqwest` client with configured timeouts and
//!   helpers that turn non-success statuses into [`HandlerError::Fetch`]
//! - [`normalize_whitespace`], [`extract_year`], [`clean_doi`]: text cleanup
//!   applied to upstream values
//! - [`parse_web_url`]: URL parsing that tolerates a missing scheme
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use url_bibtex::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let response = client
//!     .fetch_text("https://doi.org/10.1038/nature12373", Some("application/x-bibtex"), &[])
//!     .await?;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```
//!
//! [`HandlerError::Fetch`]: crate::handlers::HandlerError::Fetch

mod http;
mod text;

pub use http::{FetchedResponse, HttpClient};
pub use text::{clean_doi, extract_year, normalize_whitespace, parse_web_url};

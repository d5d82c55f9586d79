//! Configuration management.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults (public API endpoints, 30s timeout)
//! 2. a TOML file, see [`find_config_file`] for where it is looked up
//! 3. `URL_BIBTEX_*` environment variables, with `__` separating sections
//!    (e.g. `URL_BIBTEX_HTTP__TIMEOUT_SECS=10`)
//!
//! API keys additionally fall back to `SEMANTIC_SCHOLAR_API_KEY` and
//! `GITHUB_TOKEN`.

mod file_config;

pub use file_config::{
    default_config_path, find_config_file, load_config, save_config, ConfigFileError,
};

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// API keys for various services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Base URLs of the upstream services
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,

    /// GitHub token (optional, raises the API rate limit)
    #[serde(default)]
    pub github_token: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            github_token: std::env::var("GITHUB_TOKEN").ok(),
        }
    }
}

/// Base URLs of upstream services, without trailing slash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_arxiv_api")]
    pub arxiv_api: String,

    #[serde(default = "default_openreview_api")]
    pub openreview_api: String,

    #[serde(default = "default_semantic_scholar_api")]
    pub semantic_scholar_api: String,

    #[serde(default = "default_github_api")]
    pub github_api: String,

    #[serde(default = "default_github_raw")]
    pub github_raw: String,

    #[serde(default = "default_doi_resolver")]
    pub doi_resolver: String,

    #[serde(default = "default_crossref_api")]
    pub crossref_api: String,

    #[serde(default = "default_acl_anthology")]
    pub acl_anthology: String,

    #[serde(default = "default_ieee_xplore")]
    pub ieee_xplore: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            arxiv_api: default_arxiv_api(),
            openreview_api: default_openreview_api(),
            semantic_scholar_api: default_semantic_scholar_api(),
            github_api: default_github_api(),
            github_raw: default_github_raw(),
            doi_resolver: default_doi_resolver(),
            crossref_api: default_crossref_api(),
            acl_anthology: default_acl_anthology(),
            ieee_xplore: default_ieee_xplore(),
        }
    }
}

fn default_arxiv_api() -> String {
    "http://export.arxiv.org/api".to_string()
}

fn default_openreview_api() -> String {
    "https://api2.openreview.net".to_string()
}

fn default_semantic_scholar_api() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_github_raw() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_doi_resolver() -> String {
    "https://doi.org".to_string()
}

fn default_crossref_api() -> String {
    "https://api.crossref.org".to_string()
}

fn default_acl_anthology() -> String {
    "https://aclanthology.org".to_string()
}

fn default_ieee_xplore() -> String {
    "https://ieeexplore.ieee.org".to_string()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

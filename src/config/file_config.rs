//! Configuration file support for url-bibtex.
//!
//! This module provides TOML configuration file parsing with support
//! for environment variable overrides.
//!
//! # Configuration File Format
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "url-bibtex/0.1.0"
//!
//! [api_keys]
//! semantic_scholar = "your-api-key"
//! github_token = "ghp_..."
//!
//! [endpoints]
//! arxiv_api = "http://export.arxiv.org/api"
//! doi_resolver = "https://doi.org"
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

use super::Config;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "url-bibtex.toml";

/// Locate a configuration file.
///
/// Checks `./url-bibtex.toml`, then `<config dir>/url-bibtex/config.toml`
/// (e.g. `~/.config/url-bibtex/config.toml` on Linux).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

/// Per-user configuration file location, whether or not it exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("url-bibtex").join("config.toml"))
}

/// Load configuration from an explicit file, or from the file found by
/// [`find_config_file`], then apply `URL_BIBTEX_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigFileError::Io(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading config from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            if let Some(found) = find_config_file() {
                debug!("Loading config from {}", found.display());
                builder = builder.add_source(config::File::from(found.as_path()));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("URL_BIBTEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;

    if config.api_keys.semantic_scholar.is_none() {
        config.api_keys.semantic_scholar = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok();
    }
    if config.api_keys.github_token.is_none() {
        config.api_keys.github_token = std::env::var("GITHUB_TOKEN").ok();
    }

    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content = config.to_toml()?;
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeys, Endpoints};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[http]
timeout_secs = 5
user_agent = "test-agent/1.0"

[api_keys]
semantic_scholar = "test-key"

[endpoints]
doi_resolver = "http://localhost:9999"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.user_agent, "test-agent/1.0");
        assert_eq!(config.api_keys.semantic_scholar.as_deref(), Some("test-key"));
        assert_eq!(config.endpoints.doi_resolver, "http://localhost:9999");
        assert_eq!(config.endpoints.arxiv_api, Endpoints::default().arxiv_api);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigFileError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\ntimeout_secs = \"soon\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = Config {
            api_keys: ApiKeys {
                semantic_scholar: None,
                github_token: None,
            },
            ..Config::default()
        };
        config.http.timeout_secs = 12;
        save_config(&config, &path).unwrap();

        let reloaded = load_config(Some(&path)).unwrap();
        assert_eq!(reloaded.http.timeout_secs, 12);
        assert_eq!(reloaded.endpoints, config.endpoints);
    }
}

//! Response shapes exposed by the hosting layers (MCP tools, CLI JSON output).

use serde::{Deserialize, Serialize};

/// Name and description of a registered handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// Handler identifier (e.g. "arxiv")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// What URLs the handler accepts and where it gets metadata from
    pub description: String,
}

/// Result of converting one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// The URL that was converted
    pub url: String,

    /// BibTeX entry, present on success
    pub bibtex: Option<String>,

    /// Whether conversion succeeded
    pub success: bool,

    /// Error message, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConvertResponse {
    /// Create a successful response
    pub fn success(url: impl Into<String>, bibtex: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bibtex: Some(bibtex.into()),
            success: true,
            error: None,
        }
    }

    /// Create a failed response
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bibtex: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Health report of a converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" when at least one handler is registered, "degraded" otherwise
    pub status: String,

    /// Number of registered handlers
    pub handlers: usize,
}

/// Listing of registered handlers, in dispatch order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlersResponse {
    pub handlers: Vec<HandlerDescriptor>,
    pub count: usize,
}

impl From<Vec<HandlerDescriptor>> for HandlersResponse {
    fn from(handlers: Vec<HandlerDescriptor>) -> Self {
        let count = handlers.len();
        Self { handlers, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serialization() {
        let response = ConvertResponse::failure("ftp://example.com/x", "No handler found");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["bibtex"], serde_json::Value::Null);
        assert_eq!(json["error"], "No handler found");
    }

    #[test]
    fn test_success_omits_error() {
        let response = ConvertResponse::success("https://arxiv.org/abs/1", "@misc{x,\n}");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }
}

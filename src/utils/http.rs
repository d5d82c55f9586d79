//! HTTP client utilities.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::handlers::HandlerError;

/// Body and headers of a successful response
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,

    /// Response body decoded as text
    pub body: String,
}

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self::from_config(&HttpConfig::default())
            .unwrap_or_else(|_| Self::from_client(Arc::new(Client::new())))
    }

    /// Create a client with the timeouts and user agent from configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, HandlerError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| HandlerError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// GET a URL and return its body; any non-2xx status is a fetch error
    pub async fn fetch_text(
        &self,
        url: &str,
        accept: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<FetchedResponse, HandlerError> {
        match self.fetch(url, accept, headers).await? {
            Ok(response) => Ok(response),
            Err(status) => Err(status_error(status, url)),
        }
    }

    /// Like [`fetch_text`](Self::fetch_text), but a 404 yields `None`
    pub async fn fetch_optional_text(
        &self,
        url: &str,
        accept: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Option<FetchedResponse>, HandlerError> {
        match self.fetch(url, accept, headers).await? {
            Ok(response) => Ok(Some(response)),
            Err(StatusCode::NOT_FOUND) => Ok(None),
            Err(status) => Err(status_error(status, url)),
        }
    }

    /// GET a URL and deserialize its JSON body
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, HandlerError> {
        let response = self
            .fetch_text(url, Some("application/json"), headers)
            .await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Send the request; the inner `Err` carries a non-success status
    async fn fetch(
        &self,
        url: &str,
        accept: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Result<FetchedResponse, StatusCode>, HandlerError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("{} returned HTTP {}", url, status.as_u16());
            return Ok(Err(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(Ok(FetchedResponse {
            status: status.as_u16(),
            content_type,
            body,
        }))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn status_error(status: StatusCode, url: &str) -> HandlerError {
    HandlerError::Fetch(format!("HTTP {} from {}", status.as_u16(), url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[tokio::test]
    async fn test_fetch_text_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("accept", "text/html")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html></html>")
            .create_async()
            .await;

        let client = HttpClient::new();
        let response = client
            .fetch_text(&format!("{}/page", server.url()), Some("text/html"), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<html></html>");
        assert!(response.content_type.unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_non_success_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpClient::new();
        let err = client
            .fetch_text(&format!("{}/missing", server.url()), None, &[])
            .await
            .unwrap_err();

        match err {
            HandlerError::Fetch(msg) => assert!(msg.contains("503")),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_maps_404_to_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/CITATION.cff")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new();
        let response = client
            .fetch_optional_text(&format!("{}/CITATION.cff", server.url()), None, &[])
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_fetch_json_with_headers() {
        #[derive(Deserialize)]
        struct Repo {
            name: String,
        }

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/psf/requests")
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "requests"}"#)
            .create_async()
            .await;

        let client = HttpClient::new();
        let repo: Repo = client
            .fetch_json(
                &format!("{}/repos/psf/requests", server.url()),
                &[("x-api-key", "secret")],
            )
            .await
            .unwrap();
        assert_eq!(repo.name, "requests");
    }

    #[tokio::test]
    async fn test_fetch_json_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/bad")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::new();
        let result: Result<serde_json::Value, _> = client
            .fetch_json(&format!("{}/bad", server.url()), &[])
            .await;
        assert!(matches!(result, Err(HandlerError::Parse(_))));
    }
}

//! Mock handler for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::handlers::{Handler, HandlerError};
use crate::models::{EntryType, Metadata, MetadataBuilder};

/// A mock handler for testing that recognizes URLs containing a fixed
/// substring and returns a predefined result.
#[derive(Debug)]
pub struct MockHandler {
    id: String,
    pattern: String,
    result: Mutex<Option<Result<Metadata, HandlerError>>>,
    calls: AtomicUsize,
}

impl MockHandler {
    /// Create a mock handler that recognizes URLs containing `pattern`.
    pub fn new(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            result: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set the metadata to return.
    pub fn set_metadata(&self, metadata: Metadata) {
        if let Ok(mut guard) = self.result.lock() {
            *guard = Some(Ok(metadata));
        }
    }

    /// Make extraction fail with the given error.
    pub fn set_error(&self, error: HandlerError) {
        if let Ok(mut guard) = self.result.lock() {
            *guard = Some(Err(error));
        }
    }

    /// Number of times `extract` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Handler for MockHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Handler"
    }

    fn description(&self) -> &str {
        "Returns predefined metadata for URLs containing a fixed pattern"
    }

    fn recognize(&self, url: &str) -> bool {
        url.contains(&self.pattern)
    }

    async fn extract(&self, url: &str) -> Result<Metadata, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let configured = self.result.lock().ok().and_then(|guard| guard.clone());
        match configured {
            Some(result) => result,
            None => Ok(make_metadata("Mock Entry", url)),
        }
    }
}

/// Helper function to create usable metadata for testing.
pub fn make_metadata(title: &str, url: &str) -> Metadata {
    MetadataBuilder::new(title, EntryType::Misc)
        .author("Test Author")
        .url(url)
        .build()
}

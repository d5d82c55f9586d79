//! Core data models for citable works and hosting responses.

mod metadata;
mod response;

pub use metadata::{EntryType, IdentifierKind, Metadata, MetadataBuilder};
pub use response::{ConvertResponse, HandlerDescriptor, HandlersResponse, HealthResponse};

//! Shared data models for the podfeed backend.
//!
//! This crate provides:
//! - Provider and link type enums
//! - Link classification (URL → `LinkInfo`) and formatting (`LinkInfo` → URL)
//! - Quality selectors
//! - Feed metadata and the derived feed document model
//! - Feed creation request validation

pub mod classifier;
pub mod feed;
pub mod link;
pub mod provider;
pub mod quality;
pub mod request;

// Re-export common types
pub use classifier::parse_link;
pub use feed::{
    FeedDocument, FeedItem, FeedMetadata, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};
pub use link::{download_link, feed_link, make_link, LinkError, LinkInfo, LinkResult};
pub use provider::{LinkType, Provider, UnknownVariant};
pub use quality::Quality;
pub use request::CreateFeedRequest;

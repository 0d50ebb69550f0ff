//! Provider API clients and feed builders.
//!
//! A [`BuilderRegistry`] maps each [`podfeed_models::Provider`] to a
//! [`FeedBuilder`] that queries the provider's API and produces a
//! [`podfeed_models::FeedDocument`] with per-item download links.

pub mod builder;
pub mod config;
pub mod error;
pub mod vimeo;
pub mod youtube;

pub use builder::{BuilderRegistry, FeedBuilder, VimeoBuilder, YouTubeBuilder};
pub use config::ProviderConfig;
pub use error::{BuilderError, BuilderResult};
pub use vimeo::VimeoClient;
pub use youtube::YouTubeClient;

//! youtube-dl wrapper and caching video URL resolver.
//!
//! This crate provides:
//! - A youtube-dl argument builder and a bounded-time process runner
//! - Provider/quality format selection
//! - Fixed-pause retry for transient failures
//! - `VideoResolver`, which caches resolved URLs in the `video_urls` namespace

pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod resolver;
pub mod retry;

pub use command::{check_ytdl, CommandOutput, CommandRunner, YtdlCommand};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use format::format_for;
pub use resolver::{UrlExtractor, VideoResolver, YtdlExtractor};
pub use retry::{retry, Exhausted, RetryPolicy};

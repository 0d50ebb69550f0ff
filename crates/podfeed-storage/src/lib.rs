//! Feed metadata store and TTL cache.
//!
//! This crate provides:
//! - A key-value backend abstraction with Redis and in-memory implementations
//! - Collision-free short feed ids (counter + salted hashids)
//! - The feed metadata store with sliding expiry
//! - A namespaced read-through cache

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed_store;
pub mod hashid;

pub use backend::{KvBackend, MemoryBackend, RedisBackend};
pub use cache::{ResolveCache, FEEDS_NAMESPACE, FEEDS_TTL, VIDEO_URLS_NAMESPACE, VIDEO_URLS_TTL};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use feed_store::FeedStore;
pub use hashid::{FeedIdCodec, FEED_ID_ALPHABET};

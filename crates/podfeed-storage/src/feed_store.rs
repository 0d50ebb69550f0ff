//! Feed metadata store keyed by short generated ids.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use podfeed_models::{FeedMetadata, LinkType, Provider, Quality, DEFAULT_PAGE_SIZE};

use crate::backend::KvBackend;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::hashid::FeedIdCodec;

// Persisted field names. Older rows were written PascalCase, so reads are case-insensitive.
const FIELD_PROVIDER: &str = "provider";
const FIELD_TYPE: &str = "type";
const FIELD_ID: &str = "id";
const FIELD_QUALITY: &str = "quality";
const FIELD_PAGE_SIZE: &str = "pageSize";
const FIELD_PATREON_ID: &str = "patreonId";

/// Persists [`FeedMetadata`] rows and allocates their ids.
#[derive(Clone)]
pub struct FeedStore {
    backend: Arc<dyn KvBackend>,
    ids: FeedIdCodec,
    config: StorageConfig,
}

impl FeedStore {
    pub fn new(backend: Arc<dyn KvBackend>, config: StorageConfig) -> StorageResult<Self> {
        let ids = FeedIdCodec::new(&config.hashid_salt, config.hashid_min_length)?;

        Ok(Self {
            backend,
            ids,
            config,
        })
    }

    /// Allocate a new id and persist the metadata under it.
    pub async fn save(&self, feed: &FeedMetadata) -> StorageResult<String> {
        let counter = self.backend.incr(&self.config.counter_key).await?;
        let counter = u64::try_from(counter)
            .map_err(|_| StorageError::backend(format!("negative feed counter {}", counter)))?;
        let feed_id = self.ids.encode(counter);

        let fields = to_fields(feed);
        let written = self
            .backend
            .hash_set_new(&feed_id, &fields, self.config.initial_ttl)
            .await?;

        if !written {
            error!(feed_id = %feed_id, counter, "Generated feed id already exists");
            return Err(StorageError::IdGeneration(feed_id));
        }

        info!(
            feed_id = %feed_id,
            provider = %feed.provider,
            link_type = %feed.link_type,
            "Saved feed"
        );
        Ok(feed_id)
    }

    /// Load a feed and push its expiry out to the idle TTL.
    pub async fn load(&self, feed_id: &str) -> StorageResult<FeedMetadata> {
        let feed_id = feed_id.trim();
        if feed_id.is_empty() {
            return Err(StorageError::InvalidKey);
        }

        let row = self.backend.hash_get_all(feed_id).await?;
        if row.is_empty() {
            return Err(StorageError::not_found(feed_id));
        }

        self.backend.expire(feed_id, self.config.idle_ttl).await?;
        debug!(feed_id = %feed_id, "Loaded feed");

        from_fields(row)
    }

    /// Round-trip time to the backend.
    pub async fn ping(&self) -> StorageResult<Duration> {
        let started = Instant::now();
        self.backend.ping().await?;
        Ok(started.elapsed())
    }
}

fn to_fields(feed: &FeedMetadata) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        (FIELD_PROVIDER, feed.provider.to_string()),
        (FIELD_TYPE, feed.link_type.to_string()),
        (FIELD_ID, feed.id.clone()),
        (FIELD_QUALITY, feed.quality.to_string()),
        (FIELD_PAGE_SIZE, feed.page_size.to_string()),
    ];

    if let Some(patreon_id) = &feed.patreon_id {
        fields.push((FIELD_PATREON_ID, patreon_id.clone()));
    }

    fields
}

fn from_fields(row: HashMap<String, String>) -> StorageResult<FeedMetadata> {
    let row: HashMap<String, String> = row
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();
    let field = |name: &str| row.get(&name.to_ascii_lowercase()).filter(|v| !v.is_empty());

    let provider = field(FIELD_PROVIDER).ok_or(StorageError::MissingField(FIELD_PROVIDER))?;
    let provider: Provider = provider
        .parse()
        .map_err(|_| StorageError::invalid_field(FIELD_PROVIDER, provider))?;

    let link_type = field(FIELD_TYPE).ok_or(StorageError::MissingField(FIELD_TYPE))?;
    let link_type: LinkType = link_type
        .parse()
        .map_err(|_| StorageError::invalid_field(FIELD_TYPE, link_type))?;

    let id = field(FIELD_ID).ok_or(StorageError::MissingField(FIELD_ID))?.clone();

    let quality = match field(FIELD_QUALITY) {
        Some(q) => q
            .parse::<Quality>()
            .map_err(|_| StorageError::invalid_field(FIELD_QUALITY, q))?,
        None => Quality::default(),
    };

    let page_size = match field(FIELD_PAGE_SIZE) {
        Some(p) => p
            .parse::<u32>()
            .map_err(|_| StorageError::invalid_field(FIELD_PAGE_SIZE, p))?,
        None => DEFAULT_PAGE_SIZE,
    };

    Ok(FeedMetadata {
        provider,
        link_type,
        id,
        quality,
        page_size,
        patreon_id: field(FIELD_PATREON_ID).cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use podfeed_models::LinkInfo;
    use std::collections::HashSet;

    fn store_with(backend: Arc<MemoryBackend>, config: StorageConfig) -> FeedStore {
        FeedStore::new(backend, config).unwrap()
    }

    fn channel_feed() -> FeedMetadata {
        FeedMetadata::new(LinkInfo::new(Provider::YouTube, LinkType::Channel, "UC123"))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = store_with(Arc::new(MemoryBackend::new()), StorageConfig::default());
        let feed = channel_feed()
            .with_quality(Quality::AudioLow)
            .with_page_size(120)
            .with_patreon_id("p-1");

        let id = store.save(&feed).await.unwrap();
        assert!(id.len() >= 4);
        assert_eq!(store.load(&id).await.unwrap(), feed);
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ids() {
        let store = store_with(Arc::new(MemoryBackend::new()), StorageConfig::default());
        let feed = channel_feed();

        let ids = futures::future::join_all((0..50).map(|_| store.save(&feed))).await;
        let ids: HashSet<String> = ids.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| id.len() >= 4));
    }

    #[tokio::test]
    async fn test_initial_ttl_expires_unloaded_feeds() {
        let config = StorageConfig {
            initial_ttl: Duration::from_millis(500),
            ..StorageConfig::default()
        };
        let store = store_with(Arc::new(MemoryBackend::new()), config);

        let id = store.save(&channel_feed()).await.unwrap();
        assert!(store.load(&id).await.is_ok());

        // A load refreshes the expiry, so use a second, untouched feed.
        let untouched = store.save(&channel_feed()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(
            store.load(&untouched).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_slides_expiry() {
        let ttl = Duration::from_millis(300);
        let config = StorageConfig {
            initial_ttl: ttl,
            idle_ttl: ttl,
            ..StorageConfig::default()
        };
        let store = store_with(Arc::new(MemoryBackend::new()), config);
        let id = store.save(&channel_feed()).await.unwrap();

        // Each load lands before the current deadline and pushes it out.
        tokio::time::sleep(Duration::from_millis(240)).await;
        store.load(&id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(store.load(&id).await.is_ok(), "alive past the initial deadline");

        // A full idle period without access lets it lapse.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(matches!(
            store.load(&id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_and_missing_ids() {
        let store = store_with(Arc::new(MemoryBackend::new()), StorageConfig::default());
        assert!(matches!(store.load("  ").await, Err(StorageError::InvalidKey)));
        assert!(matches!(
            store.load("zzzz").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_existing_key_is_an_id_generation_error() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone(), StorageConfig::default());

        // Pre-occupy the id the first counter value maps to.
        let taken = store.ids.encode(1);
        backend
            .hash_set_new(&taken, &[("id", "x".to_string())], Duration::from_secs(60))
            .await
            .unwrap();

        let err = store.save(&channel_feed()).await.unwrap_err();
        assert!(matches!(err, StorageError::IdGeneration(id) if id == taken));
    }

    #[test]
    fn test_old_rows_default_optional_fields() {
        let row = HashMap::from([
            ("Provider".to_string(), "YouTube".to_string()),
            ("Type".to_string(), "Playlist".to_string()),
            ("Id".to_string(), "PL1".to_string()),
        ]);

        let feed = from_fields(row).unwrap();
        assert_eq!(feed.quality, Quality::VideoHigh);
        assert_eq!(feed.page_size, 50);
        assert_eq!(feed.patreon_id, None);
        assert_eq!(feed.link_type, LinkType::Playlist);
    }

    #[test]
    fn test_row_field_errors() {
        let row = HashMap::from([
            ("provider".to_string(), "YouTube".to_string()),
            ("id".to_string(), "PL1".to_string()),
        ]);
        assert!(matches!(
            from_fields(row),
            Err(StorageError::MissingField("type"))
        ));

        let row = HashMap::from([
            ("provider".to_string(), "YouTube".to_string()),
            ("type".to_string(), "Channel".to_string()),
            ("id".to_string(), "UC1".to_string()),
            ("pageSize".to_string(), "lots".to_string()),
        ]);
        let err = from_fields(row).unwrap_err();
        assert!(err.is_integrity());
        assert!(matches!(
            err,
            StorageError::InvalidField {
                field: "pageSize",
                ..
            }
        ));
    }
}

//! Application state.

use std::sync::Arc;

use url::Url;

use podfeed_builders::{
    BuilderRegistry, ProviderConfig, VimeoBuilder, VimeoClient, YouTubeBuilder, YouTubeClient,
};
use podfeed_media::{check_ytdl, CommandRunner, MediaConfig, UrlExtractor, VideoResolver, YtdlExtractor};
use podfeed_storage::{FeedStore, KvBackend, RedisBackend, ResolveCache, StorageConfig};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::services::FeedService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: FeedStore,
    pub resolver: Arc<VideoResolver>,
    pub feeds: FeedService,
}

impl AppState {
    /// Connect to Redis, locate youtube-dl and build the provider clients.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let storage_config = StorageConfig::from_env();
        let backend = RedisBackend::connect(&storage_config.redis_url).await?;

        let media_config = MediaConfig::from_env();
        let ytdl = check_ytdl(&media_config.ytdl_path)?;
        let extractor = YtdlExtractor::new(CommandRunner::new(ytdl, media_config.timeout));

        let base_url = parse_base_url(&config.base_url)?;
        let builders = provider_builders(&ProviderConfig::from_env(), &base_url)?;

        Self::from_parts(
            config,
            Arc::new(backend),
            storage_config,
            Arc::new(extractor),
            media_config,
            builders,
        )
    }

    /// Assemble state from already constructed backends.
    pub fn from_parts(
        config: ApiConfig,
        backend: Arc<dyn KvBackend>,
        storage_config: StorageConfig,
        extractor: Arc<dyn UrlExtractor>,
        media_config: MediaConfig,
        builders: BuilderRegistry,
    ) -> ApiResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let cache = ResolveCache::new(Arc::clone(&backend));
        let store = FeedStore::new(backend, storage_config)?;

        let resolver = VideoResolver::new(extractor, cache.clone(), media_config.retry_delay);
        let feeds = FeedService::new(store.clone(), cache, builders, base_url);

        Ok(Self {
            config,
            store,
            resolver: Arc::new(resolver),
            feeds,
        })
    }
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    Url::parse(raw).map_err(|e| ApiError::config(format!("invalid BASE_URL '{}': {}", raw, e)))
}

/// Registry with the YouTube and Vimeo builders sharing one HTTP client.
pub fn provider_builders(config: &ProviderConfig, base_url: &Url) -> ApiResult<BuilderRegistry> {
    let http = config
        .http_client()
        .map_err(|e| ApiError::config(format!("failed to build HTTP client: {}", e)))?;

    let youtube = YouTubeClient::new(
        http.clone(),
        config.youtube_api_key.clone(),
        config.youtube_api_base.clone(),
    );
    let vimeo = VimeoClient::new(
        http,
        config.vimeo_api_key.clone(),
        config.vimeo_api_base.clone(),
    );

    Ok(BuilderRegistry::new()
        .register(Arc::new(YouTubeBuilder::new(youtube, base_url.clone())))
        .register(Arc::new(VimeoBuilder::new(vimeo, base_url.clone()))))
}

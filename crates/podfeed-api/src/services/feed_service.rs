//! Feed creation and rendering.

use tracing::info;
use url::Url;

use podfeed_builders::BuilderRegistry;
use podfeed_models::{feed_link, parse_link, CreateFeedRequest, FeedMetadata};
use podfeed_storage::{FeedStore, ResolveCache, FEEDS_NAMESPACE, FEEDS_TTL};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::rss;

/// Creates feeds and serves their rendered documents through the `feeds` cache.
#[derive(Clone)]
pub struct FeedService {
    store: FeedStore,
    cache: ResolveCache,
    builders: BuilderRegistry,
    base_url: Url,
}

impl FeedService {
    pub fn new(store: FeedStore, cache: ResolveCache, builders: BuilderRegistry, base_url: Url) -> Self {
        Self {
            store,
            cache,
            builders,
            base_url,
        }
    }

    /// Metadata a feed should be stored with for this caller.
    ///
    /// Quality and page size are honoured for privileged callers only;
    /// everyone else gets the defaults.
    pub fn metadata_for(&self, req: &CreateFeedRequest, caller: &Caller) -> ApiResult<FeedMetadata> {
        req.check().map_err(ApiError::Validation)?;

        let link = parse_link(&req.url)?;
        if !link.link_type.is_collection() {
            return Err(ApiError::bad_request(format!(
                "URL type is not supported: {}",
                link.link_type
            )));
        }

        let mut feed = FeedMetadata::new(link);
        if caller.privileged {
            if let Some(quality) = req.quality {
                feed = feed.with_quality(quality);
            }
            if let Some(page_size) = req.page_size {
                feed = feed.with_page_size(page_size);
            }
            if let Some(id) = &caller.patreon_id {
                feed = feed.with_patreon_id(id.clone());
            }
        }

        if feed.quality.is_audio() && !feed.provider.supports_audio() {
            return Err(ApiError::bad_request(format!(
                "Only YouTube supports audio feeds, got {}",
                feed.provider
            )));
        }

        Ok(feed)
    }

    /// Persist a new feed and return its public URL.
    pub async fn create(&self, req: &CreateFeedRequest, caller: &Caller) -> ApiResult<Url> {
        let feed = self.metadata_for(req, caller)?;
        let feed_id = self.store.save(&feed).await?;

        info!(
            feed_id = %feed_id,
            provider = %feed.provider,
            link_type = %feed.link_type,
            quality = %feed.quality,
            page_size = feed.page_size,
            privileged = caller.privileged,
            "Created feed"
        );
        metrics::record_feed_created(feed.provider.as_str());

        Ok(feed_link(&self.base_url, &feed_id)?)
    }

    pub async fn metadata(&self, feed_id: &str) -> ApiResult<FeedMetadata> {
        Ok(self.store.load(feed_id).await?)
    }

    /// Rendered RSS for a feed, rebuilt at most once per cache TTL.
    pub async fn rss(&self, feed_id: &str) -> ApiResult<String> {
        self.cache
            .cached_resolve(FEEDS_NAMESPACE, feed_id, FEEDS_TTL, || self.build_rss(feed_id))
            .await
    }

    async fn build_rss(&self, feed_id: &str) -> ApiResult<String> {
        let feed = self.store.load(feed_id).await?;
        let doc = self.builders.query(feed_id, &feed).await?;
        metrics::record_feed_built(feed.provider.as_str(), doc.items.len());

        let self_link = feed_link(&self.base_url, feed_id)?;
        Ok(rss::render(&doc, self_link.as_str()))
    }
}

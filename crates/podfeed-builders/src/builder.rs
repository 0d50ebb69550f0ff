//! Feed builders: turn stored [`FeedMetadata`] into a [`FeedDocument`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use url::Url;

use podfeed_models::{
    download_link, make_link, FeedDocument, FeedItem, FeedMetadata, LinkInfo, LinkType, Provider,
};

use crate::error::{BuilderError, BuilderResult};
use crate::vimeo::{CollectionKind, VimeoClient, VimeoCollection, VimeoVideo};
use crate::youtube::{ChannelQuery, YouTubeClient, YouTubeVideo};

/// Builds a feed document for one provider.
#[async_trait]
pub trait FeedBuilder: Send + Sync {
    fn provider(&self) -> Provider;

    async fn query(&self, feed_id: &str, feed: &FeedMetadata) -> BuilderResult<FeedDocument>;
}

// =============================================================================
// YouTube
// =============================================================================

pub struct YouTubeBuilder {
    client: YouTubeClient,
    base_url: Url,
}

impl YouTubeBuilder {
    pub fn new(client: YouTubeClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn make_item(&self, feed_id: &str, feed: &FeedMetadata, video: YouTubeVideo) -> BuilderResult<FeedItem> {
        let link = make_link(&LinkInfo::video(Provider::YouTube, video.id.clone()))?;
        let download_url =
            download_link(&self.base_url, feed_id, &video.id, feed.quality.extension())?;

        Ok(FeedItem {
            link: link.to_string(),
            download_url: download_url.to_string(),
            published_at: video.published_at.unwrap_or_default(),
            duration_secs: video.duration_secs,
            file_size: video.size,
            content_type: feed.quality.content_type().to_string(),
            id: video.id,
            title: video.title,
            description: video.description,
            thumbnail: video.thumbnail,
            author: video.channel_title,
        })
    }
}

#[async_trait]
impl FeedBuilder for YouTubeBuilder {
    fn provider(&self) -> Provider {
        Provider::YouTube
    }

    async fn query(&self, feed_id: &str, feed: &FeedMetadata) -> BuilderResult<FeedDocument> {
        let mut doc = match feed.link_type {
            LinkType::Channel | LinkType::User => {
                let query = if feed.link_type == LinkType::Channel {
                    ChannelQuery::Id(feed.id.clone())
                } else {
                    ChannelQuery::Username(feed.id.clone())
                };
                let channel = self.client.channel(&query).await?;
                let link = make_link(&LinkInfo::new(
                    Provider::YouTube,
                    LinkType::Channel,
                    channel.id.clone(),
                ))?;

                let mut doc = FeedDocument::new(channel.uploads_playlist_id, channel.title, link);
                doc.description = channel.description;
                doc.published_at = channel.published_at;
                doc.image = channel.thumbnail;
                doc
            }
            LinkType::Playlist => {
                let playlist = self.client.playlist(&feed.id).await?;
                let link = make_link(&LinkInfo::new(
                    Provider::YouTube,
                    LinkType::Playlist,
                    playlist.id.clone(),
                ))?;

                let mut doc = FeedDocument::new(playlist.id, playlist.title, link);
                doc.description = playlist.description;
                doc.published_at = playlist.published_at;
                doc.image = playlist.thumbnail;
                doc
            }
            other => return Err(BuilderError::UnsupportedLinkType(other)),
        };

        let ids = self
            .client
            .playlist_item_ids(&doc.guid, feed.page_size as usize)
            .await?;
        let videos = self.client.videos(&ids).await?;

        doc.items = videos
            .into_iter()
            .map(|video| self.make_item(feed_id, feed, video))
            .collect::<BuilderResult<_>>()?;
        doc.last_build_date = Utc::now();

        info!(feed_id, guid = %doc.guid, items = doc.items.len(), "Built YouTube feed");
        Ok(doc)
    }
}

// =============================================================================
// Vimeo
// =============================================================================

pub struct VimeoBuilder {
    client: VimeoClient,
    base_url: Url,
}

impl VimeoBuilder {
    pub fn new(client: VimeoClient, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Vimeo items are always served as video, whatever the stored quality.
    fn make_item(&self, feed_id: &str, video: VimeoVideo) -> BuilderResult<FeedItem> {
        let download_url = download_link(&self.base_url, feed_id, &video.id, "mp4")?;
        let link = if video.link.is_empty() {
            make_link(&LinkInfo::video(Provider::Vimeo, video.id.clone()))?.to_string()
        } else {
            video.link
        };

        Ok(FeedItem {
            download_url: download_url.to_string(),
            link,
            published_at: video.created_at.unwrap_or_default(),
            duration_secs: video.duration_secs,
            file_size: video.size,
            content_type: "video/mp4".to_string(),
            id: video.id,
            title: video.title,
            description: video.description,
            thumbnail: video.thumbnail,
            author: video.author,
        })
    }
}

fn collection_kind(link_type: LinkType) -> BuilderResult<CollectionKind> {
    match link_type {
        LinkType::Channel => Ok(CollectionKind::Channel),
        LinkType::Group => Ok(CollectionKind::Group),
        LinkType::User => Ok(CollectionKind::User),
        LinkType::Category => Ok(CollectionKind::Category),
        other => Err(BuilderError::UnsupportedLinkType(other)),
    }
}

/// `fallback_link` stands in when Vimeo omits the collection link.
fn collection_document(collection: VimeoCollection, fallback_link: String) -> FeedDocument {
    let link = if collection.link.is_empty() {
        fallback_link
    } else {
        collection.link
    };
    let mut doc = FeedDocument::new(link.clone(), collection.name, link);
    doc.description = collection.description;
    doc.published_at = collection.created_at;
    doc.image = collection.thumbnail;
    doc.author = collection.author;
    doc
}

#[async_trait]
impl FeedBuilder for VimeoBuilder {
    fn provider(&self) -> Provider {
        Provider::Vimeo
    }

    async fn query(&self, feed_id: &str, feed: &FeedMetadata) -> BuilderResult<FeedDocument> {
        let kind = collection_kind(feed.link_type)?;

        let collection = self.client.collection(kind, &feed.id).await?;
        let requested = make_link(&feed.link())?.to_string();
        let mut doc = collection_document(collection, requested);

        let videos = self
            .client
            .videos(kind, &feed.id, feed.page_size as usize)
            .await?;
        doc.items = videos
            .into_iter()
            .map(|video| self.make_item(feed_id, video))
            .collect::<BuilderResult<_>>()?;
        doc.last_build_date = Utc::now();

        info!(feed_id, guid = %doc.guid, items = doc.items.len(), "Built Vimeo feed");
        Ok(doc)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Provider → builder dispatch, assembled explicitly at start-up.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    builders: HashMap<Provider, Arc<dyn FeedBuilder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, builder: Arc<dyn FeedBuilder>) -> Self {
        self.builders.insert(builder.provider(), builder);
        self
    }

    pub fn get(&self, provider: Provider) -> BuilderResult<&Arc<dyn FeedBuilder>> {
        self.builders
            .get(&provider)
            .ok_or(BuilderError::UnsupportedProvider(provider))
    }

    /// Build the document for a stored feed with the matching provider's builder.
    pub async fn query(&self, feed_id: &str, feed: &FeedMetadata) -> BuilderResult<FeedDocument> {
        if !feed.link_type.is_collection() {
            return Err(BuilderError::UnsupportedLinkType(feed.link_type));
        }
        self.get(feed.provider)?.query(feed_id, feed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podfeed_models::Quality;
    use reqwest::Client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base_url() -> Url {
        Url::parse("http://localhost:5001").unwrap()
    }

    fn youtube_builder(server: &MockServer) -> YouTubeBuilder {
        YouTubeBuilder::new(
            YouTubeClient::new(Client::new(), "key", server.uri()),
            base_url(),
        )
    }

    async fn mount_channel_api(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(query_param("id", "UCchannel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "UCchannel",
                    "snippet": {
                        "title": "Channel",
                        "description": "About",
                        "publishedAt": "2010-05-01T10:00:00Z",
                        "thumbnails": { "high": { "url": "https://i.ytimg.com/c.jpg" } }
                    },
                    "contentDetails": { "relatedPlaylists": { "uploads": "UUchannel" } }
                }]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/playlistItems"))
            .and(query_param("playlistId", "UUchannel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    { "snippet": { "resourceId": { "videoId": "vid1" } } },
                    { "snippet": { "resourceId": { "videoId": "vid2" } } }
                ]
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "vid1,vid2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "vid2",
                        "snippet": { "title": "Second", "publishedAt": "2020-01-02T00:00:00Z" },
                        "contentDetails": { "duration": "PT1M", "definition": "sd" }
                    },
                    {
                        "id": "vid1",
                        "snippet": { "title": "First", "publishedAt": "2020-01-03T00:00:00Z" },
                        "contentDetails": { "duration": "PT4M13S", "definition": "hd" }
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    fn channel_feed() -> FeedMetadata {
        FeedMetadata::new(LinkInfo::new(Provider::YouTube, LinkType::Channel, "UCchannel"))
    }

    #[tokio::test]
    async fn test_youtube_channel_feed() {
        let server = MockServer::start().await;
        mount_channel_api(&server).await;

        let doc = youtube_builder(&server)
            .query("ab12", &channel_feed())
            .await
            .unwrap();

        assert_eq!(doc.guid, "UUchannel");
        assert_eq!(doc.title, "Channel");
        assert_eq!(doc.link, "https://youtube.com/channel/UCchannel");
        assert_eq!(doc.image.as_deref(), Some("https://i.ytimg.com/c.jpg"));

        // Playlist order is kept, not the order of the videos response.
        let ids: Vec<&str> = doc.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["vid1", "vid2"]);

        for item in &doc.items {
            assert_eq!(item.content_type, "video/mp4");
            assert!(item.duration_secs > 0);
        }
        assert_eq!(doc.items[0].file_size, 253 * 350_000);
        assert_eq!(
            doc.items[0].download_url,
            "http://localhost:5001/download/ab12/vid1.mp4"
        );
        assert_eq!(doc.items[0].link, "https://youtube.com/watch?v=vid1");
    }

    #[tokio::test]
    async fn test_youtube_audio_feed_uses_m4a() {
        let server = MockServer::start().await;
        mount_channel_api(&server).await;

        let feed = channel_feed().with_quality(Quality::AudioHigh);
        let doc = youtube_builder(&server).query("ab12", &feed).await.unwrap();

        assert!(doc.items.iter().all(|i| i.content_type == "audio/mp4"));
        assert!(doc.items[0].download_url.ends_with("/vid1.m4a"));
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let server = MockServer::start().await;
        mount_channel_api(&server).await;

        let registry = BuilderRegistry::new().register(Arc::new(youtube_builder(&server)));

        let doc = registry.query("ab12", &channel_feed()).await.unwrap();
        assert_eq!(doc.items.len(), 2);

        let vimeo = FeedMetadata::new(LinkInfo::new(Provider::Vimeo, LinkType::Group, "g"));
        assert!(matches!(
            registry.query("ab12", &vimeo).await,
            Err(BuilderError::UnsupportedProvider(Provider::Vimeo))
        ));

        let video = FeedMetadata::new(LinkInfo::video(Provider::YouTube, "vid1"));
        assert!(matches!(
            registry.query("ab12", &video).await,
            Err(BuilderError::UnsupportedLinkType(LinkType::Video))
        ));
    }

    #[tokio::test]
    async fn test_vimeo_group_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/motion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Motion",
                "description": "Motion graphics",
                "link": "https://vimeo.com/groups/motion"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/groups/motion/videos"))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "uri": "/videos/42",
                    "name": "Loop",
                    "link": "https://vimeo.com/42",
                    "duration": 30,
                    "width": 640,
                    "height": 360,
                    "created_time": "2019-03-04T05:06:07+00:00"
                }],
                "paging": { "next": null }
            })))
            .mount(&server)
            .await;

        let builder = VimeoBuilder::new(
            VimeoClient::new(Client::new(), "secret", server.uri()),
            base_url(),
        );
        let feed = FeedMetadata::new(LinkInfo::new(Provider::Vimeo, LinkType::Group, "motion"));
        let doc = builder.query("cd34", &feed).await.unwrap();

        assert_eq!(doc.guid, "https://vimeo.com/groups/motion");
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].id, "42");
        assert_eq!(doc.items[0].content_type, "video/mp4");
        assert_eq!(
            doc.items[0].download_url,
            "http://localhost:5001/download/cd34/42.mp4"
        );
    }

    #[tokio::test]
    async fn test_vimeo_feed_without_link_uses_requested_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/motion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Motion"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/groups/motion/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [],
                "paging": { "next": null }
            })))
            .mount(&server)
            .await;

        let builder = VimeoBuilder::new(
            VimeoClient::new(Client::new(), "secret", server.uri()),
            base_url(),
        );
        let feed = FeedMetadata::new(LinkInfo::new(Provider::Vimeo, LinkType::Group, "motion"));
        let doc = builder.query("cd34", &feed).await.unwrap();

        assert_eq!(doc.guid, "https://vimeo.com/groups/motion");
        assert_eq!(doc.link, "https://vimeo.com/groups/motion");
        assert!(doc.items.is_empty());
    }
}

//! Caching resolver from source video pages to direct, time-limited media URLs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use url::Url;

use podfeed_models::{Provider, Quality};
use podfeed_storage::{ResolveCache, VIDEO_URLS_NAMESPACE, VIDEO_URLS_TTL};

use crate::command::{CommandRunner, YtdlCommand};
use crate::error::{MediaError, MediaResult};
use crate::format::format_for;
use crate::retry::{retry, Exhausted, RetryPolicy};

const FORMAT_NOT_AVAILABLE: &str = "ERROR: requested format not available";

/// Something that can turn a page URL plus a format selector into a direct URL.
#[async_trait]
pub trait UrlExtractor: Send + Sync {
    async fn extract(&self, page_url: &Url, format: &str) -> MediaResult<Url>;

    /// Version string of the underlying tool.
    async fn version(&self) -> MediaResult<String>;
}

/// [`UrlExtractor`] backed by the `youtube-dl` executable.
#[derive(Debug, Clone)]
pub struct YtdlExtractor {
    runner: CommandRunner,
}

impl YtdlExtractor {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl UrlExtractor for YtdlExtractor {
    async fn extract(&self, page_url: &Url, format: &str) -> MediaResult<Url> {
        let args = YtdlCommand::new(format, page_url.as_str()).build_args();
        let output = self.runner.run(&args).await?;

        if !output.success() {
            let stderr = output.stderr.trim().to_string();
            if stderr.contains(FORMAT_NOT_AVAILABLE) {
                return Err(MediaError::unsupported_format(stderr));
            }

            return Err(MediaError::process_failed(
                format!("youtube-dl exited with {:?}", output.exit_code),
                Some(stderr),
                output.exit_code,
            ));
        }

        let line = output.stdout.lines().next().unwrap_or_default().trim();
        match Url::parse(line) {
            Ok(url) if !url.cannot_be_a_base() => Ok(url),
            _ => Err(MediaError::InvalidOutput(line.to_string())),
        }
    }

    async fn version(&self) -> MediaResult<String> {
        let output = self.runner.run(&["--version".to_string()]).await?;
        if !output.success() {
            return Err(MediaError::process_failed(
                "youtube-dl --version failed",
                Some(output.stderr),
                output.exit_code,
            ));
        }
        Ok(output.stdout.trim().to_string())
    }
}

/// Resolves video pages to direct URLs, caching successes in `video_urls`.
pub struct VideoResolver {
    extractor: Arc<dyn UrlExtractor>,
    cache: ResolveCache,
    retry: RetryPolicy,
    cache_ttl: Duration,
    version: OnceCell<String>,
}

impl VideoResolver {
    pub fn new(extractor: Arc<dyn UrlExtractor>, cache: ResolveCache, retry_delay: Duration) -> Self {
        Self {
            extractor,
            cache,
            retry: RetryPolicy::once_after("youtube-dl", retry_delay),
            cache_ttl: VIDEO_URLS_TTL,
            version: OnceCell::new(),
        }
    }

    /// Cache key for a page URL and quality: SHA-256 hex digest.
    pub fn cache_key(video_url: &Url, quality: Quality) -> String {
        let mut hasher = Sha256::new();
        hasher.update(quality.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(video_url.as_str().as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    pub async fn resolve(&self, video_url: &Url, quality: Quality) -> MediaResult<Url> {
        let host = video_url.host_str().unwrap_or_default().to_ascii_lowercase();
        let provider = Provider::from_host(host.strip_prefix("www.").unwrap_or(&host));
        let format = format_for(provider, quality)?;

        let key = Self::cache_key(video_url, quality);
        let resolved = self
            .cache
            .cached_resolve(VIDEO_URLS_NAMESPACE, &key, self.cache_ttl, || {
                self.resolve_uncached(video_url, format)
            })
            .await?;

        Url::parse(&resolved).map_err(|_| MediaError::InvalidOutput(resolved))
    }

    async fn resolve_uncached(&self, video_url: &Url, format: &str) -> MediaResult<String> {
        let started = Instant::now();
        metrics::counter!("podfeed_resolver_invocations_total").increment(1);

        let result = retry(&self.retry, MediaError::is_transient, || {
            self.extractor.extract(video_url, format)
        })
        .await;

        metrics::histogram!("podfeed_resolver_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(url) => {
                info!(url = %video_url, format, "Resolved video URL");
                Ok(url.to_string())
            }
            Err(Exhausted { error, attempts }) => {
                metrics::counter!("podfeed_resolver_failures_total").increment(1);
                warn!(url = %video_url, format, attempts, error = %error, "Failed to resolve video URL");

                if error.is_transient() {
                    Err(MediaError::Resolution {
                        message: error.to_string(),
                        attempts,
                    })
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Tool version, probed on first use and remembered afterwards.
    pub async fn version(&self) -> MediaResult<String> {
        self.version
            .get_or_try_init(|| self.extractor.version())
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podfeed_storage::MemoryBackend;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted outcomes and counts invocations.
    struct ScriptedExtractor {
        outcomes: Mutex<VecDeque<MediaResult<Url>>>,
        calls: AtomicUsize,
        version_calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(outcomes: Vec<MediaResult<Url>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                version_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UrlExtractor for ScriptedExtractor {
        async fn extract(&self, _page_url: &Url, _format: &str) -> MediaResult<Url> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MediaError::internal("no scripted outcome left")))
        }

        async fn version(&self) -> MediaResult<String> {
            self.version_calls.fetch_add(1, Ordering::SeqCst);
            Ok("2021.12.17".to_string())
        }
    }

    fn direct_url() -> Url {
        Url::parse("https://r1.googlevideo.com/videoplayback?id=1").unwrap()
    }

    fn transient() -> MediaError {
        MediaError::process_failed("HTTP Error 429", None, Some(1))
    }

    fn resolver(
        extractor: Arc<ScriptedExtractor>,
        backend: Arc<MemoryBackend>,
    ) -> VideoResolver {
        VideoResolver::new(
            extractor,
            ResolveCache::new(backend),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_retry_then_success_writes_cache_once() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![Err(transient()), Ok(direct_url())]));
        let backend = Arc::new(MemoryBackend::new());
        let resolver = resolver(extractor.clone(), backend.clone());
        let page = Url::parse("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        let url = resolver.resolve(&page, Quality::VideoHigh).await.unwrap();
        assert_eq!(url, direct_url());
        assert_eq!(extractor.calls(), 2);
        assert_eq!(backend.string_writes(), 1);

        // Served from the cache.
        let again = resolver.resolve(&page, Quality::VideoHigh).await.unwrap();
        assert_eq!(again, direct_url());
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn test_second_transient_failure_is_a_resolution_error() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![Err(transient()), Err(transient())]));
        let backend = Arc::new(MemoryBackend::new());
        let resolver = resolver(extractor.clone(), backend.clone());
        let page = Url::parse("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        let err = resolver.resolve(&page, Quality::VideoLow).await.unwrap_err();
        assert!(matches!(err, MediaError::Resolution { attempts: 2, .. }));
        assert_eq!(backend.string_writes(), 0);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_without_retry() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Err(MediaError::Timeout(Duration::from_secs(60))),
            Ok(direct_url()),
        ]));
        let backend = Arc::new(MemoryBackend::new());
        let resolver = resolver(extractor.clone(), backend.clone());
        let page = Url::parse("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        let err = resolver.resolve(&page, Quality::VideoHigh).await.unwrap_err();
        assert!(matches!(err, MediaError::Timeout(_)));
        assert_eq!(extractor.calls(), 1);
        assert_eq!(backend.string_writes(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_format_is_not_retried() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![Err(
            MediaError::unsupported_format(FORMAT_NOT_AVAILABLE),
        )]));
        let resolver = resolver(extractor.clone(), Arc::new(MemoryBackend::new()));
        let page = Url::parse("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        let err = resolver.resolve(&page, Quality::AudioHigh).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn test_vimeo_audio_fails_without_invocation() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![Ok(direct_url())]));
        let resolver = resolver(extractor.clone(), Arc::new(MemoryBackend::new()));
        let page = Url::parse("https://vimeo.com/123456").unwrap();

        let err = resolver.resolve(&page, Quality::AudioHigh).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_qualities_are_cached_separately() {
        let other = Url::parse("https://r2.googlevideo.com/videoplayback?id=2").unwrap();
        let extractor = Arc::new(ScriptedExtractor::new(vec![Ok(direct_url()), Ok(other.clone())]));
        let resolver = resolver(extractor.clone(), Arc::new(MemoryBackend::new()));
        let page = Url::parse("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        assert_eq!(resolver.resolve(&page, Quality::VideoHigh).await.unwrap(), direct_url());
        assert_eq!(resolver.resolve(&page, Quality::AudioHigh).await.unwrap(), other);
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn test_version_is_probed_once() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![]));
        let resolver = resolver(extractor.clone(), Arc::new(MemoryBackend::new()));

        assert_eq!(resolver.version().await.unwrap(), "2021.12.17");
        assert_eq!(resolver.version().await.unwrap(), "2021.12.17");
        assert_eq!(extractor.version_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_key_is_hex_sha256() {
        let page = Url::parse("https://youtube.com/watch?v=a").unwrap();
        let key = VideoResolver::cache_key(&page, Quality::VideoHigh);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, VideoResolver::cache_key(&page, Quality::VideoLow));
    }

    #[cfg(unix)]
    mod ytdl {
        use super::*;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        fn fake_ytdl(script: &str) -> tempfile::TempPath {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "#!/bin/sh\n{}", script).unwrap();
            let path = file.into_temp_path();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_extracts_first_stdout_line() {
            let script = fake_ytdl("echo https://cdn.example.com/v.mp4\necho ignored");
            let extractor =
                YtdlExtractor::new(CommandRunner::new(&*script, Duration::from_secs(5)));
            let page = Url::parse("https://youtube.com/watch?v=a").unwrap();

            let url = extractor.extract(&page, "best[ext=mp4]").await.unwrap();
            assert_eq!(url.as_str(), "https://cdn.example.com/v.mp4");
        }

        #[tokio::test]
        async fn test_format_not_available() {
            let script = fake_ytdl("echo 'ERROR: requested format not available' >&2\nexit 1");
            let extractor =
                YtdlExtractor::new(CommandRunner::new(&*script, Duration::from_secs(5)));
            let page = Url::parse("https://youtube.com/watch?v=a").unwrap();

            let err = extractor.extract(&page, "worst").await.unwrap_err();
            assert!(matches!(err, MediaError::UnsupportedFormat(_)));
            assert!(!err.is_transient());
        }

        #[tokio::test]
        async fn test_other_failures_are_transient() {
            let script = fake_ytdl("echo 'ERROR: Unable to download webpage' >&2\nexit 1");
            let extractor =
                YtdlExtractor::new(CommandRunner::new(&*script, Duration::from_secs(5)));
            let page = Url::parse("https://youtube.com/watch?v=a").unwrap();

            let err = extractor.extract(&page, "worst").await.unwrap_err();
            assert!(err.is_transient());
        }

        #[tokio::test]
        async fn test_relative_output_is_rejected() {
            let script = fake_ytdl("echo not-a-url");
            let extractor =
                YtdlExtractor::new(CommandRunner::new(&*script, Duration::from_secs(5)));
            let page = Url::parse("https://youtube.com/watch?v=a").unwrap();

            let err = extractor.extract(&page, "worst").await.unwrap_err();
            assert!(matches!(err, MediaError::InvalidOutput(_)));
        }

        #[tokio::test]
        async fn test_version() {
            let script = fake_ytdl("echo 2021.12.17");
            let extractor =
                YtdlExtractor::new(CommandRunner::new(&*script, Duration::from_secs(5)));
            assert_eq!(extractor.version().await.unwrap(), "2021.12.17");
        }
    }
}

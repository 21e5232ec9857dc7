//! Metadata client backed by the Cinemeta catalog addon.
//!
//! Cinemeta serves one JSON document per title at
//! `{base}/meta/{movie|series}/{id}.json`, wrapped in a `{"meta": ...}`
//! envelope. Series documents carry the full episode list, so episode lookups
//! fetch the series once and check the requested episode exists.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    cache::MetaCache,
    client::MetaClient,
    error::{MetaError, Result},
    media::{MediaKind, MediaRef},
    meta::Meta,
};

pub const DEFAULT_BASE_URL: &str = "https://v3-cinemeta.strem.io/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Connection settings for [`CinemetaClient`].
#[derive(Debug, Clone)]
pub struct CinemetaOptions {
    pub base_url: Url,
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    /// How long successful lookups are kept. Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for CinemetaOptions {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default Cinemeta URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetaEnvelope {
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Clone)]
pub struct CinemetaClient {
    http: reqwest::Client,
    base_url: Url,
    cache: Option<Arc<MetaCache>>,
}

impl CinemetaClient {
    pub fn new(options: CinemetaOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("cinelog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = options.base_url;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let cache = (!options.cache_ttl.is_zero())
            .then(|| Arc::new(MetaCache::new(options.cache_ttl)));

        Ok(Self {
            http,
            base_url,
            cache,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/meta/{kind}/{id}.json`, with the id escaped as a single segment.
    fn meta_url(&self, kind: MediaKind, id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["meta", kind.as_str(), &format!("{id}.json")]);
        Ok(url)
    }

    async fn fetch(&self, kind: MediaKind, id: &str) -> Result<Meta> {
        let url = self.meta_url(kind, id)?;
        debug!(%url, "Fetching meta from Cinemeta");

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Err(MetaError::NotFound),
            status if !status.is_success() => return Err(MetaError::Status(status.as_u16())),
            _ => {}
        }

        let body = response.bytes().await?;
        let envelope: MetaEnvelope = serde_json::from_slice(&body)?;
        match envelope.meta {
            Some(meta) if !meta.name.is_empty() => Ok(meta),
            _ => Err(MetaError::NotFound),
        }
    }

    fn cached(&self, media: &MediaRef) -> Option<Meta> {
        let meta = self.cache.as_ref()?.get(&media.to_string())?;
        debug!(%media, "Meta cache hit");
        Some(meta)
    }

    fn remember(&self, media: &MediaRef, meta: &Meta) {
        if let Some(cache) = &self.cache {
            cache.insert(media.to_string(), meta.clone());
        }
    }
}

#[async_trait]
impl MetaClient for CinemetaClient {
    async fn get_movie(&self, id: &str) -> Result<Meta> {
        let media = MediaRef::movie(id);
        if let Some(meta) = self.cached(&media) {
            return Ok(meta);
        }

        let meta = self.fetch(MediaKind::Movie, id).await?;
        self.remember(&media, &meta);
        Ok(meta)
    }

    async fn get_tv_show(&self, series_id: &str, season: u64, episode: u64) -> Result<Meta> {
        let media = MediaRef::episode(series_id, season, episode);
        if let Some(meta) = self.cached(&media) {
            return Ok(meta);
        }

        let mut meta = self.fetch(MediaKind::Series, series_id).await?;
        let Some(video) = meta.find_video(season, episode).cloned() else {
            debug!(%media, "Episode not listed in series meta");
            return Err(MetaError::NotFound);
        };
        // Keep only the requested episode; full series lists can be large.
        meta.videos = vec![video];

        self.remember(&media, &meta);
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, extract::Path, http::StatusCode, routing::get};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn serve_catalog(hits: Arc<AtomicUsize>) -> Url {
        let app = Router::new().route(
            "/meta/{kind}/{file}",
            get(move |Path((kind, file)): Path<(String, String)>| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    match (kind.as_str(), file.as_str()) {
                        ("movie", "tt1254207.json") => (
                            StatusCode::OK,
                            axum::Json(json!({
                                "meta": {"id": "tt1254207", "type": "movie", "name": "Big Buck Bunny", "releaseInfo": "2008"}
                            })),
                        ),
                        ("movie", "tt0000000.json") => {
                            (StatusCode::OK, axum::Json(json!({ "meta": null })))
                        }
                        ("series", "tt0944947.json") => (
                            StatusCode::OK,
                            axum::Json(json!({
                                "meta": {
                                    "id": "tt0944947",
                                    "type": "series",
                                    "name": "Game of Thrones",
                                    "releaseInfo": "2011-2019",
                                    "videos": [
                                        {"id": "tt0944947:1:1", "season": 1, "episode": 1},
                                        {"id": "tt0944947:2:5", "season": 2, "episode": 5}
                                    ]
                                }
                            })),
                        ),
                        ("movie", "tt5000000.json") => (
                            StatusCode::BAD_GATEWAY,
                            axum::Json(json!({ "err": "upstream" })),
                        ),
                        _ => (StatusCode::NOT_FOUND, axum::Json(json!({}))),
                    }
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // No trailing slash on purpose, the client has to normalize it.
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client(base_url: Url, cache_ttl: Duration) -> CinemetaClient {
        CinemetaClient::new(CinemetaOptions {
            base_url,
            timeout: Duration::from_secs(5),
            cache_ttl,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn resolves_movie_and_caches_result() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(Arc::clone(&hits)).await, DEFAULT_CACHE_TTL);

        let first = client.get_movie("tt1254207").await.unwrap();
        let second = client.get_movie("tt1254207").await.unwrap();

        assert_eq!(first.media_name(), "Big Buck Bunny (2008)");
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(Arc::clone(&hits)).await, Duration::ZERO);

        client.get_movie("tt1254207").await.unwrap();
        client.get_movie("tt1254207").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_titles_are_not_found() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(hits).await, DEFAULT_CACHE_TTL);

        assert!(client.get_movie("tt9999999").await.unwrap_err().is_not_found());
        assert!(client.get_movie("tt0000000").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn ids_cannot_escape_their_path_segment() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(hits).await, DEFAULT_CACHE_TTL);

        for id in ["tt1254207.json?", "tt1254207.json#", "../movie/tt1254207", "x/../tt1254207"] {
            let err = client.get_movie(id).await.unwrap_err();
            assert!(err.is_not_found(), "{id}: {err}");
        }
    }

    #[test]
    fn meta_url_escapes_reserved_characters() {
        let client = client(Url::parse("http://catalog.local/v3").unwrap(), Duration::ZERO);
        let url = client.meta_url(MediaKind::Movie, "../tt1?a#b").unwrap();
        assert_eq!(url.as_str(), "http://catalog.local/v3/meta/movie/..%2Ftt1%3Fa%23b.json");

        let url = client.meta_url(MediaKind::Series, "tt0944947").unwrap();
        assert_eq!(url.as_str(), "http://catalog.local/v3/meta/series/tt0944947.json");
    }

    #[test]
    fn opaque_base_urls_are_rejected() {
        let err = CinemetaClient::new(CinemetaOptions {
            base_url: Url::parse("mailto:catalog@example.com").unwrap(),
            ..CinemetaOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, MetaError::Url(_)));
    }

    #[tokio::test]
    async fn upstream_failures_are_not_reported_as_not_found() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(hits).await, DEFAULT_CACHE_TTL);

        let err = client.get_movie("tt5000000").await.unwrap_err();
        assert!(matches!(err, MetaError::Status(502)));
    }

    #[tokio::test]
    async fn episode_lookup_checks_video_list() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client(serve_catalog(hits).await, DEFAULT_CACHE_TTL);

        let meta = client.get_tv_show("tt0944947", 2, 5).await.unwrap();
        assert_eq!(meta.media_name(), "Game of Thrones (2011-2019)");
        assert_eq!(meta.videos.len(), 1);
        assert_eq!(meta.videos[0].id, "tt0944947:2:5");

        let err = client.get_tv_show("tt0944947", 9, 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = client(Url::parse("http://catalog.local/v3").unwrap(), Duration::ZERO);
        assert_eq!(client.base_url().as_str(), "http://catalog.local/v3/");
    }
}

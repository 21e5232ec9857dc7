//! Per-request structured logging.
//!
//! This module provides a tower middleware that:
//! - Emits exactly one "Handled request" record per completed request
//! - Keeps a fixed field order: status, duration, method, url, [ip,
//!   forwardedFor], [userAgent], [mediaName]
//! - Derives the media name on stream routes, either from the [`MetaSlot`]
//!   filled by the enrichment step or from its own lookup, which runs on a
//!   separate task while the rest of the chain handles the request

use std::{
    fmt,
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use cinelog_core::{Meta, MetaClient};
use tokio::{task::JoinHandle, time::Instant};
use tower::{Layer, Service};
use tracing::{Level, error, warn};

use super::{enrich::resolve_meta, route::StreamRoute, slot::MetaSlot, slot::SlotError};
use crate::logging::{LogRecord, LogSink, TracingSink};

pub const HANDLED_REQUEST: &str = "Handled request";
/// Logged in place of a media name that could not be resolved.
pub const UNKNOWN_MEDIA_NAME: &str = "?";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Which optional fields the record carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestLogOptions {
    pub log_ips: bool,
    pub log_user_agent: bool,
    pub log_media_name: bool,
    /// Skip media name resolution for stream requests without a
    /// configuration segment.
    pub requires_user_data: bool,
}

/// Where the logger gets the media name from.
#[derive(Clone)]
pub enum MediaNameSource {
    /// Read the [`MetaSlot`] written by the enrichment step.
    Slot,
    /// Resolve it with this client, concurrently with the downstream chain.
    Concurrent(Arc<dyn MetaClient>),
}

impl fmt::Debug for MediaNameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaNameSource::Slot => f.write_str("Slot"),
            MediaNameSource::Concurrent(_) => f.write_str("Concurrent"),
        }
    }
}

#[derive(Debug)]
struct Shared {
    options: RequestLogOptions,
    source: MediaNameSource,
    sink: Arc<dyn LogSink>,
}

/// Layer for the request logger
#[derive(Clone, Debug)]
pub struct RequestLogLayer {
    shared: Arc<Shared>,
}

impl RequestLogLayer {
    /// Logger emitting through [`TracingSink`].
    pub fn new(options: RequestLogOptions, source: MediaNameSource) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                source,
                sink: Arc::new(TracingSink),
            }),
        }
    }

    pub fn with_sink(self, sink: Arc<dyn LogSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                options: self.shared.options,
                source: self.shared.source.clone(),
                sink,
            }),
        }
    }

    pub fn options(&self) -> RequestLogOptions {
        self.shared.options
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            shared: self.shared.clone(),
        }
    }
}

/// Request logging service
#[derive(Clone, Debug)]
pub struct RequestLogService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S> Service<Request> for RequestLogService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // The clone is not guaranteed to be ready; keep the one that was.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let shared = self.shared.clone();

        Box::pin(async move {
            let start = Instant::now();

            let media = shared.start_media_name(&mut request);
            let details = RequestDetails::capture(&request);

            let result = inner.call(request).await;

            // Always join so the lookup never outlives the request.
            let media_name = media.finish().await;
            let response = result?;

            let record = shared.build_record(
                response.status(),
                start.elapsed(),
                details,
                media_name,
            );
            shared.sink.emit(Level::INFO, HANDLED_REQUEST, &record);

            Ok(response)
        })
    }
}

impl Shared {
    fn start_media_name(&self, request: &mut Request) -> PendingMediaName {
        if !self.options.log_media_name {
            return PendingMediaName::NotLogged;
        }
        let (kind, id) = match StreamRoute::classify(request.uri().path()) {
            None => return PendingMediaName::NotLogged,
            Some(route) if !route.has_usable_id(self.options.requires_user_data) => {
                return PendingMediaName::Skipped;
            }
            Some(route) => (route.kind.to_string(), route.id.into_owned()),
        };

        match &self.source {
            MediaNameSource::Slot => {
                PendingMediaName::Slot(MetaSlot::install(request))
            }
            MediaNameSource::Concurrent(client) => {
                let client = client.clone();
                PendingMediaName::Lookup(tokio::spawn(async move {
                    resolve_meta(client.as_ref(), Some(kind.as_str()), Some(id.as_str()))
                        .await
                }))
            }
        }
    }

    fn build_record(
        &self,
        status: StatusCode,
        elapsed: Duration,
        details: RequestDetails,
        media_name: Option<String>,
    ) -> LogRecord {
        let mut builder = LogRecord::builder()
            .int("status", status.as_u16())
            .str("duration", format!("{}ms", elapsed.as_millis()))
            .str("method", details.method)
            .str("url", details.url);

        if self.options.log_ips {
            builder = builder
                .str("ip", details.ip)
                .list("forwardedFor", details.forwarded_for);
        }
        if self.options.log_user_agent {
            builder = builder.str("userAgent", details.user_agent);
        }
        if let Some(media_name) = media_name {
            builder = builder.str("mediaName", media_name);
        }

        builder.build()
    }
}

/// Media name work started before the downstream chain runs.
enum PendingMediaName {
    /// Not a stream route, or media names are not logged.
    NotLogged,
    /// Stream route whose id can't be trusted; logged as unknown.
    Skipped,
    Slot(MetaSlot),
    Lookup(JoinHandle<Option<Meta>>),
}

impl PendingMediaName {
    /// `None` when the record carries no media name field.
    async fn finish(self) -> Option<String> {
        let meta = match self {
            PendingMediaName::NotLogged => return None,
            PendingMediaName::Skipped => None,
            PendingMediaName::Slot(slot) => match slot.get() {
                Ok(meta) => Some(meta),
                Err(SlotError::NoMeta) => {
                    warn!("Meta not found in context");
                    None
                }
                Err(err) => {
                    error!(error = %err, "Couldn't read meta from context");
                    None
                }
            },
            PendingMediaName::Lookup(handle) => match handle.await {
                Ok(meta) => meta,
                Err(err) => {
                    error!(error = %err, "Meta lookup task failed");
                    None
                }
            },
        };

        Some(
            meta.map(|meta| meta.media_name())
                .unwrap_or_else(|| UNKNOWN_MEDIA_NAME.to_string()),
        )
    }
}

/// Request facts captured before the request is handed downstream.
struct RequestDetails {
    method: String,
    url: String,
    ip: String,
    forwarded_for: Vec<String>,
    user_agent: String,
}

impl RequestDetails {
    fn capture(request: &Request) -> Self {
        let headers = request.headers();
        let forwarded_for = forwarded_for(headers);

        let url = request
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri.to_string())
            .unwrap_or_else(|| request.uri().to_string());

        let ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .or_else(|| forwarded_for.first().cloned())
            .unwrap_or_default();

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            method: request.method().to_string(),
            url,
            ip,
            forwarded_for,
            user_agent,
        }
    }
}

fn forwarded_for(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use axum::{body::Body, http::HeaderValue};
    use cinelog_core::client::MockMetaClient;
    use std::convert::Infallible;
    use tower::{ServiceBuilder, ServiceExt, service_fn};

    async fn ok_handler(_request: Request) -> Result<Response, Infallible> {
        Ok(Response::new(Body::empty()))
    }

    fn options(log_media_name: bool) -> RequestLogOptions {
        RequestLogOptions {
            log_ips: true,
            log_user_agent: true,
            log_media_name,
            requires_user_data: false,
        }
    }

    #[tokio::test]
    async fn logs_core_fields_for_plain_requests() {
        let sink = MemorySink::new();
        let layer = RequestLogLayer::new(options(true), MediaNameSource::Slot)
            .with_sink(Arc::new(sink.clone()));
        let service = ServiceBuilder::new().layer(layer).service_fn(ok_handler);

        let request = Request::builder()
            .method("GET")
            .uri("/manifest.json?x=1")
            .header(header::USER_AGENT, "Stremio/4.4")
            .header(X_FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        service.oneshot(request).await.unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::INFO);
        assert_eq!(entries[0].message, HANDLED_REQUEST);

        let record = &entries[0].record;
        assert_eq!(
            record.names(),
            vec!["status", "duration", "method", "url", "ip", "forwardedFor", "userAgent"]
        );
        assert_eq!(record.int("status"), Some(200));
        assert_eq!(record.str("url"), Some("/manifest.json?x=1"));
        assert_eq!(record.str("ip"), Some("203.0.113.7"));
        assert_eq!(
            record.list("forwardedFor"),
            Some(&["203.0.113.7".to_string(), "10.0.0.1".to_string()][..])
        );
        assert_eq!(record.str("userAgent"), Some("Stremio/4.4"));
    }

    #[tokio::test]
    async fn prefers_peer_address_for_ip() {
        let sink = MemorySink::new();
        let layer = RequestLogLayer::new(options(false), MediaNameSource::Slot)
            .with_sink(Arc::new(sink.clone()));
        let service = ServiceBuilder::new().layer(layer).service_fn(ok_handler);

        let mut request = Request::builder()
            .uri("/health")
            .header(X_FORWARDED_FOR, "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        service.oneshot(request).await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record.str("ip"), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn concurrent_mode_resolves_media_name() {
        let mut client = MockMetaClient::new();
        client
            .expect_get_movie()
            .times(1)
            .returning(|_| Ok(Meta::new("Big Buck Bunny", "2008")));

        let sink = MemorySink::new();
        let layer = RequestLogLayer::new(
            options(true),
            MediaNameSource::Concurrent(Arc::new(client)),
        )
        .with_sink(Arc::new(sink.clone()));
        let service = ServiceBuilder::new().layer(layer).service_fn(ok_handler);

        let request = Request::get("/stream/movie/tt1254207.json")
            .body(Body::empty())
            .unwrap();
        service.oneshot(request).await.unwrap();

        let record = &sink.records()[0];
        assert_eq!(record.names().last(), Some(&"mediaName"));
        assert_eq!(record.str("mediaName"), Some("Big Buck Bunny (2008)"));
    }

    #[tokio::test]
    async fn slot_mode_reads_meta_written_downstream() {
        let sink = MemorySink::new();
        let layer = RequestLogLayer::new(options(true), MediaNameSource::Slot)
            .with_sink(Arc::new(sink.clone()));
        let service = ServiceBuilder::new().layer(layer).service_fn(
            |request: Request| async move {
                MetaSlot::from_request(&request)
                    .and_then(|slot| slot.set(Meta::new("Sintel", "2010")))
                    .unwrap();
                Ok::<_, Infallible>(Response::new(Body::empty()))
            },
        );

        let request = Request::get("/abc/stream/series/tt1:1:1.json")
            .body(Body::empty())
            .unwrap();
        service.oneshot(request).await.unwrap();

        assert_eq!(sink.records()[0].str("mediaName"), Some("Sintel (2010)"));
    }

    #[tokio::test]
    async fn empty_slot_logs_placeholder() {
        let sink = MemorySink::new();
        let layer = RequestLogLayer::new(options(true), MediaNameSource::Slot)
            .with_sink(Arc::new(sink.clone()));
        let service = ServiceBuilder::new().layer(layer).service_fn(ok_handler);

        let request = Request::get("/stream/movie/tt1.json")
            .body(Body::empty())
            .unwrap();
        service.oneshot(request).await.unwrap();

        assert_eq!(
            sink.records()[0].str("mediaName"),
            Some(UNKNOWN_MEDIA_NAME)
        );
    }

    #[test]
    fn forwarded_for_merges_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("1.1.1.1, ,2.2.2.2"));
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("3.3.3.3"));

        assert_eq!(forwarded_for(&headers), vec!["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
    }

    #[test]
    fn media_name_source_debug_hides_client() {
        let source = MediaNameSource::Concurrent(Arc::new(MockMetaClient::new()));
        assert_eq!(format!("{source:?}"), "Concurrent");
    }
}

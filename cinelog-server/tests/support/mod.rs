#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{Response, header},
};
use cinelog_config::Config;
use cinelog_core::{Meta, MetaClient, MetaError};
use cinelog_server::{
    Pipeline,
    demo::build_router,
    logging::{LogRecord, MemorySink},
};
use tower::ServiceExt;

/// What a [`StubMetaClient`] answers with.
#[derive(Debug, Clone)]
pub enum Outcome {
    Found(Meta),
    NotFound,
    Unavailable,
}

/// Scripted metadata client with a fixed latency.
#[derive(Debug)]
pub struct StubMetaClient {
    outcome: Outcome,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubMetaClient {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn found(name: &str, release_info: &str) -> Self {
        Self::new(Outcome::Found(Meta::new(name, release_info)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<Meta, MetaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.outcome {
            Outcome::Found(meta) => Ok(meta.clone()),
            Outcome::NotFound => Err(MetaError::NotFound),
            Outcome::Unavailable => Err(MetaError::Status(503)),
        }
    }
}

#[async_trait]
impl MetaClient for StubMetaClient {
    async fn get_movie(&self, _id: &str) -> Result<Meta, MetaError> {
        self.answer().await
    }

    async fn get_tv_show(
        &self,
        _series_id: &str,
        _season: u64,
        _episode: u64,
    ) -> Result<Meta, MetaError> {
        self.answer().await
    }
}

/// Logging switches for a test config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub log_ips: bool,
    pub log_user_agent: bool,
    pub log_media_name: bool,
    pub put_meta_in_context: bool,
    pub requires_user_data: bool,
}

impl Flags {
    pub fn all() -> Self {
        Self {
            log_ips: true,
            log_user_agent: true,
            log_media_name: true,
            ..Self::default()
        }
    }

    pub fn slot(self) -> Self {
        Self {
            put_meta_in_context: true,
            ..self
        }
    }

    pub fn config(self) -> Config {
        let mut config = Config::default();
        config.logging.log_ips = self.log_ips;
        config.logging.log_user_agent = self.log_user_agent;
        config.logging.log_media_name = self.log_media_name;
        config.logging.put_meta_in_context = self.put_meta_in_context;
        config.addon.requires_user_data = self.requires_user_data;
        config
    }
}

/// The demo addon behind a pipeline whose records land in the returned sink.
pub fn app(flags: Flags, client: Arc<StubMetaClient>) -> (Router, MemorySink) {
    let sink = MemorySink::new();
    let pipeline = Pipeline::from_config(&flags.config(), client)
        .expect("test pipeline builds")
        .with_sink(Arc::new(sink.clone()));
    (build_router(&pipeline, flags.requires_user_data), sink)
}

pub fn get(uri: &str) -> Request {
    Request::get(uri)
        .header(header::USER_AGENT, "StremioShell/4.4.168")
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.2")
        .body(Body::empty())
        .expect("valid request")
}

pub async fn send(router: &Router, request: Request) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// The single record emitted so far.
pub fn only_record(sink: &MemorySink) -> LogRecord {
    let records = sink.records();
    assert_eq!(records.len(), 1, "expected exactly one record: {records:?}");
    records.into_iter().next().expect("one record")
}

pub fn duration_ms(record: &LogRecord) -> u64 {
    record
        .str("duration")
        .and_then(|value| value.strip_suffix("ms"))
        .and_then(|value| value.parse().ok())
        .expect("duration rendered as <n>ms")
}

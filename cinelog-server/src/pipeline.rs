//! Assembly of the instrumentation chain around an addon router.

use std::sync::Arc;

use axum::{Router, middleware};
use cinelog_config::Config;
use cinelog_core::MetaClient;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{
    errors::PipelineResult,
    logging::LogSink,
    middleware::{
        cors::cors_layer,
        enrich::{MetaEnrichment, enrich_with_meta},
        request_log::{MediaNameSource, RequestLogLayer, RequestLogOptions},
    },
};

/// How the request logger obtains media names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaNameMode {
    /// Enrichment step installed; the logger reads the request slot.
    Slot,
    /// No enrichment step; the logger resolves names on its own task.
    Concurrent,
}

/// Access-control filter, optional metadata step and request logger, built
/// once at startup from [`Config`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    cors: CorsLayer,
    enrichment: Option<MetaEnrichment>,
    request_log: Option<RequestLogLayer>,
}

impl Pipeline {
    /// Fails only on CORS allow-lists that don't form valid header values.
    pub fn from_config(
        config: &Config,
        client: Arc<dyn MetaClient>,
    ) -> PipelineResult<Self> {
        let cors = cors_layer(&config.cors)?;
        let logging = &config.logging;
        let requires_user_data = config.addon.requires_user_data;

        let enrichment = logging
            .put_meta_in_context
            .then(|| MetaEnrichment::new(client.clone(), requires_user_data));

        let request_log = (!logging.disable_request_logging).then(|| {
            let source = if enrichment.is_some() {
                MediaNameSource::Slot
            } else {
                MediaNameSource::Concurrent(client)
            };
            RequestLogLayer::new(
                RequestLogOptions {
                    log_ips: logging.log_ips,
                    log_user_agent: logging.log_user_agent,
                    log_media_name: logging.log_media_name,
                    requires_user_data,
                },
                source,
            )
        });

        let pipeline = Self {
            cors,
            enrichment,
            request_log,
        };
        info!(
            mode = ?pipeline.media_name_mode(),
            request_logging = pipeline.request_log.is_some(),
            "Request pipeline configured"
        );
        Ok(pipeline)
    }

    /// Send request records to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.request_log = self.request_log.map(|layer| layer.with_sink(sink));
        self
    }

    pub fn media_name_mode(&self) -> MediaNameMode {
        if self.enrichment.is_some() {
            MediaNameMode::Slot
        } else {
            MediaNameMode::Concurrent
        }
    }

    pub fn request_logging_enabled(&self) -> bool {
        self.request_log.is_some()
    }

    /// Install the metadata step on `stream_routes`.
    ///
    /// Call on a router holding only the stream routes, before merging it
    /// into the addon router. The routes must name their path parameters
    /// `type` and `id`, plus `config` for the configured variant.
    pub fn enrich<S>(&self, stream_routes: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match &self.enrichment {
            Some(enrichment) => stream_routes.route_layer(
                middleware::from_fn_with_state(enrichment.clone(), enrich_with_meta),
            ),
            None => stream_routes,
        }
    }

    /// Wrap the complete addon router in the logger and the access-control
    /// filter.
    pub fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let router = match &self.request_log {
            Some(layer) => router.layer(layer.clone()),
            None => router,
        };
        // CORS outermost so preflights are answered before the logger and
        // every response carries the headers.
        router.layer(self.cors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinelog_core::client::MockMetaClient;

    fn client() -> Arc<dyn MetaClient> {
        Arc::new(MockMetaClient::new())
    }

    #[test]
    fn put_meta_in_context_selects_slot_mode() {
        let mut config = Config::default();
        config.logging.put_meta_in_context = true;

        let pipeline = Pipeline::from_config(&config, client()).unwrap();
        assert_eq!(pipeline.media_name_mode(), MediaNameMode::Slot);
        assert!(pipeline.request_logging_enabled());
    }

    #[test]
    fn defaults_to_concurrent_mode() {
        let pipeline = Pipeline::from_config(&Config::default(), client()).unwrap();
        assert_eq!(pipeline.media_name_mode(), MediaNameMode::Concurrent);
    }

    #[test]
    fn request_logging_can_be_disabled() {
        let mut config = Config::default();
        config.logging.disable_request_logging = true;

        let pipeline = Pipeline::from_config(&config, client()).unwrap();
        assert!(!pipeline.request_logging_enabled());
    }

    #[test]
    fn invalid_cors_is_a_startup_error() {
        let mut config = Config::default();
        config.cors.allowed_headers = vec!["not a header".into()];

        assert!(Pipeline::from_config(&config, client()).is_err());
    }
}

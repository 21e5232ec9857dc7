//! Minimal stream addon served by the `cinelog-server` binary.
//!
//! It answers every stream request with an empty list; the interesting part
//! is the instrumentation [`Pipeline`] wrapped around it.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use serde_json::{Value, json};

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonManifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub resources: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub catalogs: Vec<Value>,
    pub id_prefixes: Vec<&'static str>,
    pub behavior_hints: BehaviorHints,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub configurable: bool,
    pub configuration_required: bool,
}

impl AddonManifest {
    pub fn new(requires_user_data: bool) -> Self {
        Self {
            id: "org.cinelog.demo",
            version: env!("CARGO_PKG_VERSION"),
            name: "Cinelog Demo",
            description: "Empty stream addon instrumented with cinelog",
            resources: vec!["stream"],
            types: vec!["movie", "series"],
            catalogs: Vec::new(),
            id_prefixes: vec!["tt"],
            behavior_hints: BehaviorHints {
                configurable: requires_user_data,
                configuration_required: requires_user_data,
            },
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn serve_manifest(State(manifest): State<Arc<AddonManifest>>) -> Json<AddonManifest> {
    Json(manifest.as_ref().clone())
}

async fn streams() -> Json<Value> {
    Json(json!({ "streams": [] }))
}

/// Stream routes with the path parameter names the enrichment step reads.
pub fn stream_routes() -> Router {
    Router::new()
        .route("/stream/{type}/{id}", get(streams))
        .route("/{config}/stream/{type}/{id}", get(streams))
}

/// The demo addon wrapped in `pipeline`.
pub fn build_router(pipeline: &Pipeline, requires_user_data: bool) -> Router {
    let manifest = Arc::new(AddonManifest::new(requires_user_data));

    let addon = Router::new()
        .route("/health", get(health))
        .route("/manifest.json", get(serve_manifest))
        .route("/{config}/manifest.json", get(serve_manifest))
        .with_state(manifest)
        .merge(pipeline.enrich(stream_routes()));

    pipeline.wrap(addon)
}

//! Metadata resolution for stream routes.
//!
//! Installed as a route layer so the `type` and `id` path parameters are
//! available. Every failure is logged here and swallowed; the request always
//! continues unchanged apart from the [`MetaSlot`] write.

use std::{fmt, sync::Arc};

use axum::{
    extract::{RawPathParams, Request, State, rejection::RawPathParamsRejection},
    middleware::Next,
    response::Response,
};
use cinelog_core::{Meta, MediaRef, MetaClient, ParseError, lookup};
use tracing::{debug, error, warn};

use super::slot::MetaSlot;

/// State for [`enrich_with_meta`].
#[derive(Clone)]
pub struct MetaEnrichment {
    client: Arc<dyn MetaClient>,
    requires_user_data: bool,
}

impl fmt::Debug for MetaEnrichment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaEnrichment")
            .field("requires_user_data", &self.requires_user_data)
            .finish_non_exhaustive()
    }
}

impl MetaEnrichment {
    pub fn new(client: Arc<dyn MetaClient>, requires_user_data: bool) -> Self {
        Self {
            client,
            requires_user_data,
        }
    }
}

/// Resolve the title addressed by a stream request.
///
/// Shared by the enrichment step and the concurrent request logger so both
/// apply the same parsing and error suppression.
pub async fn resolve_meta(
    client: &dyn MetaClient,
    kind: Option<&str>,
    id: Option<&str>,
) -> Option<Meta> {
    let media = match MediaRef::from_params(kind, id) {
        Ok(media) => media,
        Err(ParseError::MissingParams) => {
            warn!(kind, id, "Stream request is missing the type or id parameter");
            return None;
        }
        Err(err) => {
            warn!(kind, id, error = %err, "Couldn't parse stream request id");
            return None;
        }
    };

    match lookup(client, &media).await {
        Ok(meta) => {
            debug!(media = %media, name = %meta.name, "Resolved meta");
            Some(meta)
        }
        Err(err) if err.is_not_found() => {
            debug!(media = %media, "No meta found");
            None
        }
        Err(err) => {
            error!(media = %media, error = %err, "Couldn't get meta");
            None
        }
    }
}

/// Axum middleware writing the resolved [`Meta`] into the request's
/// [`MetaSlot`].
pub async fn enrich_with_meta(
    State(enrichment): State<MetaEnrichment>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    let slot = MetaSlot::install(&mut request);

    let params = match params {
        Ok(params) => params,
        Err(rejection) => {
            warn!(error = %rejection, "Couldn't read path parameters for meta lookup");
            return next.run(request).await;
        }
    };

    let mut kind = None;
    let mut id = None;
    let mut configured = false;
    for (key, value) in &params {
        match key {
            "type" => kind = Some(value),
            "id" => id = Some(value),
            "config" => configured = !value.is_empty(),
            _ => {}
        }
    }

    if enrichment.requires_user_data && !configured {
        debug!("Skipping meta lookup for unconfigured stream request");
        return next.run(request).await;
    }

    if let Some(meta) = resolve_meta(enrichment.client.as_ref(), kind, id).await {
        if let Err(err) = slot.set(meta) {
            warn!(error = %err, "Couldn't store meta in request context");
        }
    }

    next.run(request).await
}

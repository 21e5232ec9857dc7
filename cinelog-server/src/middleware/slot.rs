//! Request-scoped hand-off of resolved metadata.
//!
//! The metadata enrichment step is the only writer and the request logger is
//! the only reader. The slot lives in the request extensions behind an `Arc`
//! so the logger can still read it after the downstream handler has consumed
//! the request.

use std::sync::{Arc, OnceLock};

use axum::http::Request;
use cinelog_core::Meta;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// Nothing was written, either because no lookup ran or because it failed.
    #[error("no meta in request context")]
    NoMeta,
    #[error("meta was already written for this request")]
    AlreadyWritten,
    #[error("request carries no meta slot")]
    Missing,
}

/// Write-once cell holding the [`Meta`] resolved for the current request.
#[derive(Debug, Clone, Default)]
pub struct MetaSlot(Arc<OnceLock<Meta>>);

impl MetaSlot {
    /// Return the slot attached to the request, attaching an empty one first
    /// if needed.
    pub fn install<B>(request: &mut Request<B>) -> Self {
        if let Some(slot) = request.extensions().get::<MetaSlot>() {
            return slot.clone();
        }
        let slot = MetaSlot::default();
        request.extensions_mut().insert(slot.clone());
        slot
    }

    pub fn from_request<B>(request: &Request<B>) -> Result<Self, SlotError> {
        request
            .extensions()
            .get::<MetaSlot>()
            .cloned()
            .ok_or(SlotError::Missing)
    }

    pub fn set(&self, meta: Meta) -> Result<(), SlotError> {
        self.0.set(meta).map_err(|_| SlotError::AlreadyWritten)
    }

    pub fn get(&self) -> Result<Meta, SlotError> {
        self.0.get().cloned().ok_or(SlotError::NoMeta)
    }
}

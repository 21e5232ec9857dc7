//! # Cinelog Core
//!
//! Shared building blocks for instrumenting Stremio addon requests:
//!
//! - [`media`]: parsing of the `type`/`id` path parameters into a [`MediaRef`]
//! - [`meta`]: the descriptive metadata resolved for a title
//! - [`client`]: the [`MetaClient`] seam used by the enrichment and logging
//!   middleware
//! - [`cinemeta`]: the production client backed by the Cinemeta catalog, with
//!   a TTL cache in front of it
//!
//! Nothing in this crate knows about HTTP servers; the middleware lives in
//! `cinelog-server`.

pub mod cache;
pub mod cinemeta;
pub mod client;
pub mod error;
pub mod media;
pub mod meta;

pub use cache::MetaCache;
pub use cinemeta::{CinemetaClient, CinemetaOptions};
pub use client::{MetaClient, lookup};
pub use error::{MetaError, ParseError};
pub use media::{MediaKind, MediaRef};
pub use meta::{Meta, Video};

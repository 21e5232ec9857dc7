//! # Cinelog Server
//!
//! Request instrumentation for Stremio addons built on axum.
//!
//! A [`Pipeline`] is assembled once from configuration and installs, from
//! the outside in:
//!
//! - the access-control filter (`tower-http` CORS), answering preflights
//! - the request logger, one structured record per request
//! - optionally, the metadata step on stream routes, which resolves the
//!   requested title and stores it in the request for the logger
//!
//! Without the metadata step the logger resolves titles itself on a
//! separate task, overlapping the lookup with the addon handler.

pub mod demo;
pub mod errors;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod pipeline;

pub use errors::{PipelineError, PipelineResult};
pub use pipeline::{MediaNameMode, Pipeline};

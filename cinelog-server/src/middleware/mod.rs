pub mod cors;
pub mod enrich;
pub mod request_log;
pub mod route;
pub mod slot;

pub use cors::cors_layer;
pub use enrich::{MetaEnrichment, enrich_with_meta, resolve_meta};
pub use request_log::{
    HANDLED_REQUEST, MediaNameSource, RequestLogLayer, RequestLogOptions,
    RequestLogService, UNKNOWN_MEDIA_NAME,
};
pub use route::StreamRoute;
pub use slot::{MetaSlot, SlotError};

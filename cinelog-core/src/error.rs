use thiserror::Error;

/// Outcome of a failed metadata lookup.
#[derive(Error, Debug)]
pub enum MetaError {
    /// The catalog has no entry for the requested title.
    #[error("No metadata available")]
    NotFound,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    Status(u16),

    #[error("Invalid metadata payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

impl MetaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetaError::NotFound)
    }
}

/// Rejection of the media type/id path parameters.
///
/// Each variant carries the offending value so callers can attach it to the
/// warning they log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Can't determine media type and/or IMDb ID from path parameters")]
    MissingParams,

    #[error("Unsupported media type: {0}")]
    UnknownKind(String),

    #[error("No 3 elements after splitting TV show ID by \":\": {0}")]
    EpisodeShape(String),

    #[error("Can't parse season as int: {0}")]
    Season(String),

    #[error("Can't parse episode as int: {0}")]
    Episode(String),
}

pub type Result<T> = std::result::Result<T, MetaError>;

use cinelog_config::ConfigGuardRailError;
use thiserror::Error;

/// Startup-time failures while assembling the middleware chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid CORS configuration: {0}")]
    Cors(#[from] ConfigGuardRailError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

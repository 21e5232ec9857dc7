//! Guard rails applied after the configuration is composed.

use std::fmt;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::models::{Config, CorsConfig};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("server port must not be 0")]
    ZeroPort,
    #[error("cinemeta timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid CORS method '{0}'")]
    InvalidCorsMethod(String),
    #[error("invalid CORS header '{0}'")]
    InvalidCorsHeader(String),
    #[error("invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),
    #[error("CORS allow-list '{0}' must not be empty")]
    EmptyCorsList(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} ({})", self.message, hint),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(&mut self, message: impl Into<String>, hint: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.server.port == 0 {
        return Err(ConfigGuardRailError::ZeroPort);
    }

    if config.cinemeta.timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout);
    }

    validate_cors(config, &mut warnings)?;

    let logging = &config.logging;
    if logging.put_meta_in_context && !logging.log_media_name {
        warnings.push_with_hint(
            "put_meta_in_context is enabled but log_media_name is not",
            "metadata is still resolved for stream requests; disable put_meta_in_context if no handler reads it",
        );
    }
    if logging.disable_request_logging
        && (logging.log_ips || logging.log_user_agent || logging.log_media_name)
    {
        warnings.push("request logging is disabled; log_ips, log_user_agent and log_media_name have no effect");
    }

    Ok(warnings)
}

/// CORS allow-lists parsed into HTTP types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsAllowLists {
    /// `None` when a `*` entry allows every origin.
    pub origins: Option<Vec<HeaderValue>>,
    pub methods: Vec<Method>,
    pub headers: Vec<HeaderName>,
}

/// Parse the configured allow-lists. Entries are trimmed.
pub fn parse_cors_allow_lists(cors: &CorsConfig) -> Result<CorsAllowLists, ConfigGuardRailError> {
    if cors.allowed_origins.is_empty() {
        return Err(ConfigGuardRailError::EmptyCorsList("allowed_origins"));
    }
    if cors.allowed_methods.is_empty() {
        return Err(ConfigGuardRailError::EmptyCorsList("allowed_methods"));
    }

    let methods = cors
        .allowed_methods
        .iter()
        .map(|method| {
            Method::from_bytes(method.trim().as_bytes())
                .map_err(|_| ConfigGuardRailError::InvalidCorsMethod(method.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let headers = cors
        .allowed_headers
        .iter()
        .map(|header| {
            HeaderName::from_bytes(header.trim().as_bytes())
                .map_err(|_| ConfigGuardRailError::InvalidCorsHeader(header.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let explicit_origins = cors
        .allowed_origins
        .iter()
        .filter(|origin| origin.trim() != "*")
        .map(|origin| {
            HeaderValue::from_str(origin.trim())
                .map_err(|_| ConfigGuardRailError::InvalidCorsOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsAllowLists {
        origins: (!cors.is_wildcard_included()).then_some(explicit_origins),
        methods,
        headers,
    })
}

fn validate_cors(
    config: &Config,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    let cors = &config.cors;
    parse_cors_allow_lists(cors)?;

    if cors.is_wildcard_included() && cors.allowed_origins.len() > 1 {
        warnings.push_with_hint(
            "CORS origins contain '*' alongside explicit origins",
            "the wildcard wins; explicit origins are ignored",
        );
    }

    Ok(())
}

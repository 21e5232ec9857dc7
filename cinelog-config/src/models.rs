use std::{path::PathBuf, str::FromStr, time::Duration};

use cinelog_core::CinemetaOptions;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub addon: AddonConfig,
    pub cinemeta: CinemetaConfig,
    pub cors: CorsConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Request logging switches.
///
/// `put_meta_in_context` installs the metadata enrichment step in front of
/// the logger, which then reads the media name from the request instead of
/// resolving it itself.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub log_ips: bool,
    pub log_user_agent: bool,
    pub log_media_name: bool,
    pub put_meta_in_context: bool,
    pub disable_request_logging: bool,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(other.to_string()),
        }
    }
}

/// Addon manifest facts the pipeline depends on.
#[derive(Debug, Clone, Default)]
pub struct AddonConfig {
    /// Mirrors `behaviorHints.configurationRequired` of the manifest.
    pub requires_user_data: bool,
}

#[derive(Debug, Clone)]
pub struct CinemetaConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Zero disables the lookup cache.
    pub cache_ttl: Duration,
}

impl Default for CinemetaConfig {
    fn default() -> Self {
        let CinemetaOptions {
            base_url,
            timeout,
            cache_ttl,
        } = CinemetaOptions::default();
        Self {
            base_url,
            timeout,
            cache_ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_cors_origins(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
        }
    }
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

pub(crate) fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

pub(crate) fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

/// Headers Stremio clients send on addon requests.
pub(crate) fn default_cors_headers() -> Vec<String> {
    [
        "Accept",
        "Accept-Language",
        "Content-Type",
        // Not safelisted by the Fetch standard
        "Origin",
        "Accept-Encoding",
        "Content-Language",
        "X-Requested-With",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use cinelog_core::cinemeta::{DEFAULT_BASE_URL, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};

    use super::*;

    #[test]
    fn cinemeta_defaults_match_client_defaults() {
        let config = CinemetaConfig::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
    }
}

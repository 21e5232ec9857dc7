use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub logging: FileLoggingConfig,
    #[serde(default)]
    pub addon: FileAddonConfig,
    #[serde(default)]
    pub cinemeta: FileCinemetaConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_ips: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_user_agent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_media_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put_meta_in_context: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_request_logging: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAddonConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_user_data: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCinemetaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Humantime duration, e.g. `"2s"` or `"1500ms"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
}

/// Environment-derived configuration values.
///
/// Values are kept as raw strings; the loader parses them so a malformed
/// variable is reported instead of silently ignored.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub log_ips: Option<String>,
    pub log_user_agent: Option<String>,
    pub log_media_name: Option<String>,
    pub put_meta_in_context: Option<String>,
    pub disable_request_logging: Option<String>,
    pub log_format: Option<String>,
    pub requires_user_data: Option<String>,
    pub cinemeta_url: Option<String>,
    pub cinemeta_timeout: Option<String>,
    pub cinemeta_cache_ttl: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allowed_methods: Option<Vec<String>>,
    pub cors_allowed_headers: Option<Vec<String>>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables instead of the process
    /// environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let var = |name: &str| vars.get(name).cloned();
        let csv = |name: &str| vars.get(name).map(|raw| parse_csv(raw));

        Self {
            config_path: var("CINELOG_CONFIG").map(PathBuf::from),
            server_host: var("CINELOG_HOST"),
            server_port: var("CINELOG_PORT"),
            log_ips: var("CINELOG_LOG_IPS"),
            log_user_agent: var("CINELOG_LOG_USER_AGENT"),
            log_media_name: var("CINELOG_LOG_MEDIA_NAME"),
            put_meta_in_context: var("CINELOG_PUT_META_IN_CONTEXT"),
            disable_request_logging: var("CINELOG_DISABLE_REQUEST_LOGGING"),
            log_format: var("CINELOG_LOG_FORMAT"),
            requires_user_data: var("CINELOG_REQUIRES_USER_DATA"),
            cinemeta_url: var("CINELOG_CINEMETA_URL"),
            cinemeta_timeout: var("CINELOG_CINEMETA_TIMEOUT"),
            cinemeta_cache_ttl: var("CINELOG_CINEMETA_CACHE_TTL"),
            cors_allowed_origins: csv("CINELOG_CORS_ALLOWED_ORIGINS"),
            cors_allowed_methods: csv("CINELOG_CORS_ALLOWED_METHODS"),
            cors_allowed_headers: csv("CINELOG_CORS_ALLOWED_HEADERS"),
        }
    }
}

fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Parse a boolean flag the way the environment usually spells them.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use url::Url;

use crate::{
    models::{
        AddonConfig, CinemetaConfig, Config, ConfigMetadata, CorsConfig, LogFormat,
        LoggingConfig, ServerConfig, DEFAULT_HOST, DEFAULT_PORT,
    },
    sources::{parse_bool, EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("cinelog.toml"),
        PathBuf::from("config/cinelog.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Skip `.env` handling and the process environment entirely.
    pub env_override: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env_override = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.env_override {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) =
            compose_config(file_config, env_config, config_path, env_file_loaded)?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        result.or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(ConfigLoadError::EnvFile(err)),
        })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env_config.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No cinelog.toml detected; using defaults and environment variables",
            "Set CINELOG_CONFIG or pass --config to load a configuration file",
        );
    }

    let FileConfig {
        server: file_server,
        logging: file_logging,
        addon: file_addon,
        cinemeta: file_cinemeta,
        cors: file_cors,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: match env.server_port {
            Some(raw) => parse_env("CINELOG_PORT", &raw)?,
            None => file_server.port.unwrap_or(DEFAULT_PORT),
        },
    };

    let logging = LoggingConfig {
        log_ips: flag("CINELOG_LOG_IPS", env.log_ips, file_logging.log_ips)?,
        log_user_agent: flag(
            "CINELOG_LOG_USER_AGENT",
            env.log_user_agent,
            file_logging.log_user_agent,
        )?,
        log_media_name: flag(
            "CINELOG_LOG_MEDIA_NAME",
            env.log_media_name,
            file_logging.log_media_name,
        )?,
        put_meta_in_context: flag(
            "CINELOG_PUT_META_IN_CONTEXT",
            env.put_meta_in_context,
            file_logging.put_meta_in_context,
        )?,
        disable_request_logging: flag(
            "CINELOG_DISABLE_REQUEST_LOGGING",
            env.disable_request_logging,
            file_logging.disable_request_logging,
        )?,
        format: match env.log_format.or(file_logging.format) {
            Some(raw) => LogFormat::from_str(&raw)
                .map_err(|value| ConfigLoadError::InvalidValue {
                    key: "log format",
                    value,
                })?,
            None => LogFormat::default(),
        },
    };

    let addon = AddonConfig {
        requires_user_data: flag(
            "CINELOG_REQUIRES_USER_DATA",
            env.requires_user_data,
            file_addon.requires_user_data,
        )?,
    };

    let defaults = CinemetaConfig::default();
    let cinemeta = CinemetaConfig {
        base_url: match env.cinemeta_url.or(file_cinemeta.base_url) {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|source| ConfigLoadError::InvalidUrl { value: raw, source })?,
            None => defaults.base_url,
        },
        timeout: duration(
            "cinemeta timeout",
            env.cinemeta_timeout.or(file_cinemeta.timeout),
            defaults.timeout,
        )?,
        cache_ttl: duration(
            "cinemeta cache ttl",
            env.cinemeta_cache_ttl.or(file_cinemeta.cache_ttl),
            defaults.cache_ttl,
        )?,
    };

    let cors_defaults = CorsConfig::default();
    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or(cors_defaults.allowed_origins),
        allowed_methods: env
            .cors_allowed_methods
            .or(file_cors.allowed_methods)
            .unwrap_or(cors_defaults.allowed_methods),
        allowed_headers: env
            .cors_allowed_headers
            .or(file_cors.allowed_headers)
            .unwrap_or(cors_defaults.allowed_headers),
    };

    let config = Config {
        server,
        logging,
        addon,
        cinemeta,
        cors,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    Ok((config, warnings))
}

fn flag(
    key: &'static str,
    env_value: Option<String>,
    file_value: Option<bool>,
) -> Result<bool, ConfigLoadError> {
    match env_value {
        Some(raw) => parse_bool(&raw).ok_or(ConfigLoadError::InvalidValue { key, value: raw }),
        None => Ok(file_value.unwrap_or(false)),
    }
}

fn duration(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|_| ConfigLoadError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_env<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigLoadError> {
    raw.trim().parse().map_err(|_| ConfigLoadError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file {path} was requested but does not exist")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid URL '{value}'")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

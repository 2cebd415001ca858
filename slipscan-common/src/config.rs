//! Relay configuration loading
//!
//! Configuration is resolved once at startup into a [`RelayConfig`] that is
//! handed to the router. Priority order for each setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! The backend URL has no compiled default. When it is not configured the
//! relay still starts and answers every relay call with 503.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable holding the extraction backend base URL
pub const ENV_BACKEND_URL: &str = "SLIPSCAN_BACKEND_URL";
/// Environment variable holding the relay listen address
pub const ENV_BIND: &str = "SLIPSCAN_BIND";
/// Environment variable holding the TOML config file path
pub const ENV_CONFIG: &str = "SLIPSCAN_CONFIG";

pub const DEFAULT_BIND: &str = "127.0.0.1:5780";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// On-disk configuration file (`relay.toml`)
///
/// Every key is optional; a missing file is the same as an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend_url: Option<String>,

    #[serde(default)]
    pub bind: Option<SocketAddr>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub bind: Option<SocketAddr>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Extraction backend base URL, without trailing slash
    pub backend_url: Option<String>,
    pub bind: SocketAddr,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            bind: default_bind(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5780))
}

impl RelayConfig {
    /// Resolve configuration from CLI overrides, the environment and TOML
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| env_value(ENV_CONFIG).map(PathBuf::from));

        let toml_config = match config_path {
            // An explicitly named file must exist
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                load_toml_config(&path)?.unwrap_or_default()
            }
            None => match default_config_path() {
                Some(path) => load_toml_config(&path)?.unwrap_or_default(),
                None => TomlConfig::default(),
            },
        };

        let env_bind = match env_value(ENV_BIND) {
            Some(raw) => Some(raw.parse::<SocketAddr>().map_err(|e| {
                Error::Config(format!("{} is not a valid address '{}': {}", ENV_BIND, raw, e))
            })?),
            None => None,
        };

        let layered = ConfigOverrides {
            backend_url: overrides.backend_url.or_else(|| env_value(ENV_BACKEND_URL)),
            bind: overrides.bind.or(env_bind),
            config_path: None,
        };

        Self::from_parts(layered, toml_config)
    }

    /// Merge already-layered overrides over a TOML config
    ///
    /// Pure function: reads neither the environment nor the filesystem.
    pub fn from_parts(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let raw_url = overrides.backend_url.or(toml_config.backend_url);
        let backend_url = match raw_url {
            Some(raw) => normalize_base_url(&raw)?,
            None => None,
        };

        let request_timeout_secs = toml_config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let max_upload_bytes = toml_config
            .max_upload_bytes
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        if max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            backend_url,
            bind: overrides.bind.or(toml_config.bind).unwrap_or_else(default_bind),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_upload_bytes,
            log_level: toml_config.logging.level,
        })
    }

    pub fn backend_configured(&self) -> bool {
        self.backend_url.is_some()
    }
}

/// Validate and normalize a service base URL
///
/// Blank input counts as "not configured". Anything else must be an absolute
/// http(s) URL with a host and no query or fragment; trailing slashes are
/// dropped so endpoint paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::Config(format!(
                "URL must start with http:// or https://: '{}'",
                trimmed
            ))
        })?;

    // The URL parser skips extra slashes, so an empty authority is caught here
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(Error::Config(format!("URL has no host: '{}'", trimmed)));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("Invalid URL '{}': {}", trimmed, e)))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(Error::Config(format!("URL has no host: '{}'", trimmed)));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::Config(format!(
            "URL must not carry a query or fragment: '{}'",
            trimmed
        )));
    }

    Ok(Some(trimmed.trim_end_matches('/').to_string()))
}

/// Load a TOML config file; `Ok(None)` when the file does not exist
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e))
    })?;
    debug!("Loaded config file {}", path.display());
    Ok(Some(config))
}

/// Default config file location: `<config dir>/slipscan/relay.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slipscan").join("relay.toml"))
}

/// Non-blank environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url(" https://ocr.example.com/api/ ").unwrap(),
            Some("https://ocr.example.com/api".to_string())
        );
    }

    #[test]
    fn test_normalize_blank_is_unconfigured() {
        assert_eq!(normalize_base_url("   ").unwrap(), None);
    }

    #[test]
    fn test_normalize_rejects_bad_urls() {
        assert!(normalize_base_url("ocr.example.com").is_err());
        assert!(normalize_base_url("ftp://ocr.example.com").is_err());
        assert!(normalize_base_url("http:///extract").is_err());
        assert!(normalize_base_url("http://a b").is_err());
        assert!(normalize_base_url("http://:80").is_err());
        assert!(normalize_base_url("http://host:notaport").is_err());
        assert!(normalize_base_url("http://?x").is_err());
        assert!(normalize_base_url("http://ocr.example.com/?key=1").is_err());
    }

    #[test]
    fn test_normalize_keeps_port_and_path() {
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8000/ocr/").unwrap(),
            Some("http://127.0.0.1:8000/ocr".to_string())
        );
    }

    #[test]
    fn test_cli_beats_toml() {
        let toml_config = TomlConfig {
            backend_url: Some("http://from-toml:8000".to_string()),
            bind: Some("0.0.0.0:9000".parse().unwrap()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            backend_url: Some("http://from-cli:8000/".to_string()),
            ..Default::default()
        };
        let config = RelayConfig::from_parts(overrides, toml_config).unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://from-cli:8000"));
        assert_eq!(config.bind, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_defaults_without_backend() {
        let config =
            RelayConfig::from_parts(ConfigOverrides::default(), TomlConfig::default()).unwrap();
        assert!(!config.backend_configured());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_zero_limits_rejected() {
        let toml_config = TomlConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(RelayConfig::from_parts(ConfigOverrides::default(), toml_config).is_err());

        let toml_config = TomlConfig {
            max_upload_bytes: Some(0),
            ..Default::default()
        };
        assert!(RelayConfig::from_parts(ConfigOverrides::default(), toml_config).is_err());
    }
}

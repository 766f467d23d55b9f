//! TOML Configuration File Support
//!
//! Configuration for the controller lives at
//! `$XDG_CONFIG_HOME/inkframe/controller.toml` (typically
//! `~/.config/inkframe/controller.toml`).
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [gateway]
//! base_url = "https://message-server-lurk.onrender.com"
//! request_timeout_secs = 30
//!
//! [display]
//! poll_interval_secs = 15
//!
//! [upload]
//! crop_aspect = "5:3"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `INKFRAME_GATEWAY_URL` | `gateway.base_url` |
//! | `INKFRAME_REQUEST_TIMEOUT_SECS` | `gateway.request_timeout_secs` |
//! | `INKFRAME_POLL_INTERVAL_SECS` | `display.poll_interval_secs` |
//! | `INKFRAME_CROP_ASPECT` | `upload.crop_aspect` |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::controller::{ControllerConfig, DEFAULT_POLL_INTERVAL};
use crate::media::AspectRatio;

/// Gateway used when nothing else is configured
pub const DEFAULT_GATEWAY_URL: &str = "https://message-server-lurk.onrender.com";

/// Shortest poll interval accepted
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

const ENV_GATEWAY_URL: &str = "INKFRAME_GATEWAY_URL";
const ENV_REQUEST_TIMEOUT: &str = "INKFRAME_REQUEST_TIMEOUT_SECS";
const ENV_POLL_INTERVAL: &str = "INKFRAME_POLL_INTERVAL_SECS";
const ENV_CROP_ASPECT: &str = "INKFRAME_CROP_ASPECT";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[gateway]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayToml {
    /// Base URL of the message server
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[display]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Seconds between reconciler ticks
    pub poll_interval_secs: Option<u64>,
}

/// `[upload]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadToml {
    /// Center-crop staged photos to this ratio, e.g. `"5:3"`
    pub crop_aspect: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerToml {
    /// Gateway section
    pub gateway: GatewayToml,

    /// Display section
    pub display: DisplayToml,

    /// Upload section
    pub upload: UploadToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved controller configuration
///
/// Use [`load_config_from_path`] to build one with proper priority handling, then
/// [`ConfigOverrides::apply`] for CLI flags and [`ControllerConfigFile::validate`]
/// before use.
#[derive(Clone, Debug)]
pub struct ControllerConfigFile {
    /// Gateway base URL
    pub base_url: String,

    /// Per-request timeout, `None` for the HTTP client default
    pub request_timeout: Option<Duration>,

    /// Time between reconciler ticks
    pub poll_interval: Duration,

    /// Default crop for staged photos
    pub crop_aspect: Option<AspectRatio>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ControllerConfigFile {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            request_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            crop_aspect: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ControllerConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that cannot be checked while parsing
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the base URL is not an
    /// absolute http(s) URL, the request timeout is zero, or the poll
    /// interval is under one second.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::ValidationError(format!("gateway URL '{}': {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "gateway URL '{}' must use http or https",
                self.base_url
            )));
        }
        if self.request_timeout.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ValidationError(
                "request timeout must be at least 1s; omit it for no timeout".to_string(),
            ));
        }
        if self.poll_interval < MIN_POLL_INTERVAL {
            return Err(ConfigError::ValidationError(format!(
                "poll interval must be at least {}s",
                MIN_POLL_INTERVAL.as_secs()
            )));
        }
        Ok(())
    }

    /// Controller settings derived from this file
    #[must_use]
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: self.poll_interval,
            crop_aspect: self.crop_aspect,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/inkframe/controller.toml` or
/// `~/.config/inkframe/controller.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("inkframe").join("controller.toml"))
}

/// Load configuration from a file, then the environment
///
/// Pass [`default_config_path`] for the usual location.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if it holds an unparseable crop ratio.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ControllerConfigFile, ConfigError> {
    let mut config = ControllerConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ControllerToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(
    config: &mut ControllerConfigFile,
    toml: &ControllerToml,
) -> Result<(), ConfigError> {
    if let Some(ref url) = toml.gateway.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = toml.gateway.request_timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }
    if let Some(secs) = toml.display.poll_interval_secs {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(ref ratio) = toml.upload.crop_aspect {
        let ratio = ratio
            .parse::<AspectRatio>()
            .map_err(|e| ConfigError::ValidationError(format!("upload.crop_aspect: {e}")))?;
        config.crop_aspect = Some(ratio);
    }
    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ControllerConfigFile) {
    apply_env_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`
///
/// Unparseable values are logged and skipped.
fn apply_env_from<F>(config: &mut ControllerConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_GATEWAY_URL) {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
        match value.parse::<u64>() {
            Ok(secs) => {
                config.request_timeout = Some(Duration::from_secs(secs));
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_REQUEST_TIMEOUT, value = %value, "Ignoring invalid value"),
        }
    }
    if let Some(value) = lookup(ENV_POLL_INTERVAL) {
        match value.parse::<u64>() {
            Ok(secs) => {
                config.poll_interval = Duration::from_secs(secs);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_POLL_INTERVAL, value = %value, "Ignoring invalid value"),
        }
    }
    if let Some(value) = lookup(ENV_CROP_ASPECT) {
        match value.parse::<AspectRatio>() {
            Ok(ratio) => {
                config.crop_aspect = Some(ratio);
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(var = ENV_CROP_ASPECT, value = %value, "Ignoring invalid value: {}", e),
        }
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Values given on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Gateway base URL override
    pub gateway: Option<String>,

    /// Poll interval override, in seconds
    pub poll_interval_secs: Option<u64>,

    /// Crop ratio override
    pub crop_aspect: Option<AspectRatio>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set gateway override
    #[must_use]
    pub fn with_gateway(mut self, url: String) -> Self {
        self.gateway = Some(url);
        self
    }

    /// Set poll interval override
    #[must_use]
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    /// Set crop ratio override
    #[must_use]
    pub fn with_crop_aspect(mut self, ratio: AspectRatio) -> Self {
        self.crop_aspect = Some(ratio);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ControllerConfigFile) {
        if self.gateway.is_some() || self.poll_interval_secs.is_some() || self.crop_aspect.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.gateway {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(ratio) = self.crop_aspect {
            config.crop_aspect = Some(ratio);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

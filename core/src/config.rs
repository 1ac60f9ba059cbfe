use crate::errors::{SetuError, SetuResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Directory name under the user's config dir
pub const APP_NAME: &str = "yojana-setu";

/// Prefix for environment overrides, e.g. `SETU_BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "SETU";

/// Where the caseworker backend lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Pacing of the portal reveal and fill sequence, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    /// Upper bound on waiting for the portal's ready signal
    pub reveal_timeout_ms: u64,
    /// Pause in "Agent Accessing Portal..." before filling starts
    pub access_delay_ms: u64,
    /// Pause after each field is written
    pub field_delay_ms: u64,
    /// Pause after the last field before submitting
    pub submit_delay_ms: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            reveal_timeout_ms: 1500,
            access_delay_ms: 1000,
            field_delay_ms: 600,
            submit_delay_ms: 1500,
        }
    }
}

impl PortalConfig {
    pub fn reveal_timeout(&self) -> Duration {
        Duration::from_millis(self.reveal_timeout_ms)
    }

    pub fn access_delay(&self) -> Duration {
        Duration::from_millis(self.access_delay_ms)
    }

    pub fn field_delay(&self) -> Duration {
        Duration::from_millis(self.field_delay_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

/// Settings for the WhatsApp and IVR emulators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    /// How many prior messages the WhatsApp emulator sends as history
    pub history_window: usize,
    pub ivr_connect_delay_ms: u64,
    /// Phone identifier the emulators send to the backend
    pub demo_phone: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            ivr_connect_delay_ms: 2000,
            demo_phone: crate::session::GUEST_PHONE.to_string(),
        }
    }
}

impl ChannelConfig {
    pub fn ivr_connect_delay(&self) -> Duration {
        Duration::from_millis(self.ivr_connect_delay_ms)
    }
}

/// Terminal client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    pub log_level: String,
    /// Overrides the default session file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            session_file: None,
        }
    }
}

/// Complete configuration for every surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SetuConfig {
    pub backend: BackendConfig,
    pub portal: PortalConfig,
    pub channels: ChannelConfig,
    pub cli: CliConfig,
}

impl SetuConfig {
    /// Layers the TOML file and `SETU_*` environment variables over the defaults.
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> SetuResult<Self> {
        let file = match path {
            Some(p) => p.to_path_buf(),
            None => get_default_config_file()?,
        };
        debug!("Loading configuration from {}", file.display());

        let settings = config::Config::builder()
            .add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Toml)
                    .required(path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> SetuResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SetuError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SetuError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            SetuError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Session file from config, or the default location
    pub fn resolve_session_file(&self) -> SetuResult<PathBuf> {
        match &self.cli.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_default_config_dir()?.join("session.toml")),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir() -> SetuResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or_else(|| {
            SetuError::ConfigError("Could not determine configuration directory".to_string())
        })?;

    Ok(config_dir.join(APP_NAME))
}

/// Helper function to get default config file path
pub fn get_default_config_file() -> SetuResult<PathBuf> {
    Ok(get_default_config_dir()?.join("config.toml"))
}

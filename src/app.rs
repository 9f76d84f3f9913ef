use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::BaseDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::api::client::HttpContactService;
use crate::api::error::ServiceError;
use crate::coordinator::{ChatSettings, ContactSupportCoordinator, ContactSupportObserver};
use crate::opener::SystemOpener;

const CONFIG_FILE: &str = "contact-support.toml";
const DEFAULT_CHAT_FALLBACK: &str = "https://apps.apple.com/app/whatsapp-messenger/id310633997";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("config I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid chat fallback URL: {0}")]
    FallbackUrl(#[from] url::ParseError),
}

/// Which of the two support screens is being shown. Only presentation differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Mel,
    Rum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub chat_greeting: String,
    pub chat_fallback_url: String,
    pub variant: Variant,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: 10,
            chat_greeting: "Oi".to_string(),
            chat_fallback_url: DEFAULT_CHAT_FALLBACK.to_string(),
            variant: Variant::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join(CONFIG_FILE))
    }

    /// Reads the config at `path`, or the default location. A missing or
    /// broken file yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        match Self::read(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("ignoring config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or(ConfigError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn chat_settings(&self) -> Result<ChatSettings, ConfigError> {
        Ok(ChatSettings {
            greeting: self.chat_greeting.clone(),
            fallback_url: Url::parse(&self.chat_fallback_url)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Wires the HTTP service and the desktop opener into a coordinator that
/// reports to `observer`.
pub fn build_screen(
    config: &AppConfig,
    observer: Box<dyn ContactSupportObserver>,
) -> Result<ContactSupportCoordinator, SetupError> {
    let base_url = crate::utils::normalize_url(&config.base_url);
    let service = HttpContactService::new(&base_url, config.request_timeout())?;
    Ok(ContactSupportCoordinator::new(
        Arc::new(service),
        Arc::new(SystemOpener::new()),
        observer,
        config.chat_settings()?,
    ))
}

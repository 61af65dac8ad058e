use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use ragreader_controller::IdentitySource;

/// CLI configuration loaded from TOML file.
///
/// Also serves as the local identity store: `login` writes the username
/// here and the loading controller reads it back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// API server URL; overrides `API_URL` when set
    #[serde(default)]
    pub server_url: Option<String>,

    /// Identity of the logged-in user
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(skip)]
    path: PathBuf,
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/ragreader-cli/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("ragreader-cli");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };
        Self::load_from(&config_path)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let mut config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            config.path = config_path.to_path_buf();
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            let config = Self {
                path: config_path.to_path_buf(),
                ..Self::default()
            };
            config.save().ok();
            Ok(config)
        }
    }

    /// Write the config back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir: {}", parent.display()))?;
        }
        let toml_str = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(&self.path, toml_str)
            .with_context(|| format!("failed to write config: {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_identity(&mut self, username: &str, email: &str) {
        self.username = Some(username.trim().to_string());
        self.email = Some(email.trim().to_string());
    }

    pub fn clear_identity(&mut self) {
        self.username = None;
        self.email = None;
    }

    /// Resolve the API server URL.
    /// Priority: cli_override > config file > None (environment default).
    pub fn resolve_server_url(&self, cli_override: Option<&str>) -> Option<String> {
        cli_override
            .map(str::to_string)
            .or_else(|| self.server_url.clone())
            .filter(|url| !url.trim().is_empty())
    }
}

impl IdentitySource for CliConfig {
    fn identity(&self) -> Option<String> {
        self.username.clone()
    }
}

//! Configuration resolution for Sigil.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/sigil/settings.json)
//! 3. Project config (.sigil/settings.json)
//! 4. Environment variables (highest priority)
//!
//! The resolved config yields the [`ProtocolConfig`] handed to the
//! envelope protocol at construction; nothing in the crypto core reads
//! the environment on its own.

use serde::{Deserialize, Serialize};
use sigil_crypto::ProtocolConfig;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Sigil configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Identity key configuration.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Hex-encoded secp256k1 private scalar. Usually supplied via
    /// `SIGIL_PRIVATE_KEY_HEX` rather than written to a settings file.
    pub private_key_hex: Option<String>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field(
                "private_key_hex",
                &self.private_key_hex.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Emit structured JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Build the crypto-layer configuration, requiring the identity secret.
    pub fn protocol_config(&self) -> Result<ProtocolConfig> {
        let private_key_hex = self.identity.private_key_hex.clone().ok_or_else(|| {
            Error::Config("no identity secret configured (set SIGIL_PRIVATE_KEY_HEX)".to_string())
        })?;
        Ok(ProtocolConfig { private_key_hex })
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".sigil").join("settings.json");
        if project_path.exists() {
            let project = load_config_file(&project_path)?;
            merge_config(&mut config, project);
        }
    }

    // Apply environment overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".sigil").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/sigil/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("sigil").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    if overlay.identity.private_key_hex.is_some() {
        base.identity.private_key_hex = overlay.identity.private_key_hex;
    }
    base.log = overlay.log;
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("SIGIL_PRIVATE_KEY_HEX") {
        config.identity.private_key_hex = Some(val);
    }
    if let Ok(val) = std::env::var("SIGIL_LOG_LEVEL") {
        config.log.level = val;
    }
    if let Ok(val) = std::env::var("SIGIL_LOG_JSON") {
        if let Ok(json) = val.parse() {
            config.log.json = json;
        }
    }
}

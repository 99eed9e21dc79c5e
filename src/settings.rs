//! Persisted user settings and credential resolution

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::rewrite::RewriteConfig;
use crate::{Error, Result};

/// Name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Values saved between runs. Every field is optional.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Reads and writes [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform config directory
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::ConfigError("no config directory on this platform".into()))?;
        Ok(Self::at(dir.join("groomcard").join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings at {}", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&raw).map_err(|e| {
            Error::ConfigError(format!("invalid settings file {}: {}", self.path.display(), e))
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(settings)
            .map_err(|e| Error::ConfigError(format!("failed to serialize settings: {}", e)))?;
        fs::write(&self.path, raw)?;
        debug!("saved settings to {}", self.path.display());
        Ok(())
    }

    /// Persist a new API key, keeping the other settings.
    pub fn set_api_key(&self, key: &str) -> Result<Settings> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::ConfigError("API key must not be blank".into()));
        }
        let mut settings = self.load()?;
        settings.api_key = Some(key.to_string());
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn clear_api_key(&self) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.api_key = None;
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Where a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed on the command line or through the environment
    Override,
    Settings,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub source: CredentialSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the credential to use: an explicit override wins over the persisted
/// key. Blank values count as absent.
pub fn resolve_credential(explicit: Option<&str>, settings: &Settings) -> Option<Credential> {
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    if let Some(key) = explicit.and_then(non_blank) {
        return Some(Credential {
            key,
            source: CredentialSource::Override,
        });
    }
    settings
        .api_key
        .as_deref()
        .and_then(non_blank)
        .map(|key| Credential {
            key,
            source: CredentialSource::Settings,
        })
}

/// Rewrite settings for one run, given the outcome of loading the settings
/// file.
///
/// An explicit key does not depend on the file: if loading failed the error
/// is logged and the defaults are used for model and endpoint. Without an
/// explicit key the load error is returned. `Ok(None)` means no key is
/// configured anywhere.
pub fn rewrite_config(
    explicit: Option<&str>,
    loaded: Result<Settings>,
) -> Result<Option<RewriteConfig>> {
    let has_explicit = explicit.is_some_and(|k| !k.trim().is_empty());
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) if has_explicit => {
            warn!("ignoring unreadable settings: {}", e);
            Settings::default()
        }
        Err(e) => return Err(e),
    };

    let Some(credential) = resolve_credential(explicit, &settings) else {
        return Ok(None);
    };
    debug!("using API key from {:?}", credential.source);
    let mut config = RewriteConfig::new(credential.key);
    if let Some(model) = &settings.model {
        config = config.with_model(model.as_str());
    }
    if let Some(endpoint) = &settings.endpoint {
        config = config.with_endpoint(endpoint.as_str());
    }
    Ok(Some(config))
}

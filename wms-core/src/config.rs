use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WmsError;
use crate::model::SoundEvent;
use crate::rules::{DuplicateWindow, SiteCalendar};

/// `scheme://user:password@` in a connection URL
static URL_PASSWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<head>[a-z][a-z0-9+.-]*://[^:/@]+):(?P<pw>[^@]*)@")
        .expect("invalid url password regex")
});

/// Configuration for the scanner service and the `wms` CLI.
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsConfig {
    pub database: DatabaseConfig,
    pub server: ServerSection,
    pub auth: AuthConfig,
    pub scanning: ScanningConfig,
    pub rate_limits: RateLimitConfig,
    pub sound: SoundConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/wms".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Catalog, report and admin routes need a session when set
    pub required: bool,
    pub session_ttl_minutes: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: true,
            session_ttl_minutes: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// IANA zone used for "today" and report day bounds
    pub timezone: String,
    pub duplicate_window_hours: u32,
    /// Recorded as the scanning user when no session is present
    pub default_user: String,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Bangkok".to_string(),
            duplicate_window_hours: crate::rules::duplicate::DEFAULT_WINDOW_HOURS,
            default_user: "system".to_string(),
        }
    }
}

impl ScanningConfig {
    pub fn calendar(&self) -> Result<SiteCalendar, WmsError> {
        SiteCalendar::from_name(&self.timezone).map_err(|_| {
            WmsError::config(format!(
                "timezone '{}' is not a valid IANA name",
                self.timezone
            ))
        })
    }

    pub fn duplicate_window(&self) -> DuplicateWindow {
        DuplicateWindow::from_hours(self.duplicate_window_hours)
    }
}

/// Requests per minute per client, by route group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub scan: u32,
    pub read: u32,
    pub write: u32,
    pub export: u32,
    pub login: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            scan: 120,
            read: 100,
            write: 50,
            export: 25,
            login: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    pub default_volume: f32,
    pub defaults: SoundDefaults,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_volume: 0.8,
            defaults: SoundDefaults::default(),
        }
    }
}

/// Fallback sound files when the database holds no setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundDefaults {
    pub success: String,
    pub error: String,
    pub duplicate: String,
    pub warning: String,
}

impl Default for SoundDefaults {
    fn default() -> Self {
        Self {
            success: "/static/sounds/success.mp3".to_string(),
            error: "/static/sounds/error.mp3".to_string(),
            duplicate: "/static/sounds/duplicate.mp3".to_string(),
            warning: "/static/sounds/warning.mp3".to_string(),
        }
    }
}

impl SoundDefaults {
    pub fn for_event(&self, event: SoundEvent) -> &str {
        match event {
            SoundEvent::Success => &self.success,
            SoundEvent::Error => &self.error,
            SoundEvent::Duplicate => &self.duplicate,
            SoundEvent::Warning => &self.warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl WmsConfig {
    /// Load config, apply environment overrides and validate.
    ///
    /// Path resolution: `explicit` > `WMS_CONFIG` > `~/.wms/config.toml`.
    /// An explicitly named file must exist; the default one may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = env::var_os("WMS_CONFIG").map(PathBuf::from);
        let (path, must_exist) = match (explicit, from_env) {
            (Some(p), _) => (p.to_path_buf(), true),
            (None, Some(p)) => (p, true),
            (None, None) => (Self::config_path(), false),
        };

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if must_exist {
            return Err(WmsError::ConfigNotFound { path }.into());
        } else {
            tracing::debug!(?path, "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid TOML")
    }

    /// Get config file path: ~/.wms/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wms/config.toml")
    }

    /// Apply `DATABASE_URL`, `WMS_BIND` and `WMS_TIMEZONE`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(bind) = lookup("WMS_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = bind;
        }
        if let Some(tz) = lookup("WMS_TIMEZONE").filter(|v| !v.is_empty()) {
            self.scanning.timezone = tz;
        }
    }

    pub fn validate(&self) -> Result<(), WmsError> {
        self.scanning.calendar()?;

        if self.database.max_connections == 0 {
            return Err(WmsError::config("database.max_connections must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.sound.default_volume) {
            return Err(WmsError::config("sound.default_volume must be between 0.0 and 1.0"));
        }
        let limits = &self.rate_limits;
        if [limits.scan, limits.read, limits.write, limits.export, limits.login].contains(&0) {
            return Err(WmsError::config("rate limits must be at least 1 request per minute"));
        }
        Ok(())
    }

    /// Copy with the database password replaced by `***`.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.database.url = mask_url_password(&self.database.url);
        copy
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Save config to file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

pub fn mask_url_password(url: &str) -> String {
    URL_PASSWORD_RE
        .replace(url, "${head}:***@")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = WmsConfig::from_toml("").unwrap();
        assert_eq!(config, WmsConfig::default());
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.rate_limits.scan, 120);
        assert_eq!(config.scanning.duplicate_window_hours, 8760);
        assert!(config.auth.required);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = WmsConfig::from_toml(
            r#"
            [scanning]
            duplicate_window_hours = 24

            [sound.defaults]
            error = "/custom/error.wav"
            "#,
        )
        .unwrap();

        assert_eq!(config.scanning.duplicate_window_hours, 24);
        assert_eq!(config.scanning.timezone, "Asia/Bangkok");
        assert_eq!(config.sound.defaults.for_event(SoundEvent::Error), "/custom/error.wav");
        assert_eq!(
            config.sound.defaults.for_event(SoundEvent::Success),
            "/static/sounds/success.mp3"
        );
    }

    #[test]
    fn overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://wms:secret@db/wms"),
            ("WMS_TIMEZONE", "UTC"),
            ("WMS_BIND", ""),
        ]
        .into_iter()
        .collect();

        let mut config = WmsConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.url, "postgres://wms:secret@db/wms");
        assert_eq!(config.scanning.timezone, "UTC");
        assert_eq!(config.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn validate_rejects_bad_timezone() {
        let mut config = WmsConfig::default();
        config.scanning.timezone = "Mars/Olympus".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let mut config = WmsConfig::default();
        config.rate_limits.export = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn masks_password() {
        assert_eq!(
            mask_url_password("postgres://wms:s3cr3t@db:5432/wms"),
            "postgres://wms:***@db:5432/wms"
        );
        assert_eq!(mask_url_password("postgres://localhost/wms"), "postgres://localhost/wms");
    }

    #[test]
    fn save_then_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = WmsConfig::default();
        config.server.bind = "0.0.0.0:8080".to_string();
        config.save(&path).unwrap();

        let loaded = WmsConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WmsConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config not found"));
    }
}

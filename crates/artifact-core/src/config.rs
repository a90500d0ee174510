use crate::error::{CrudError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn")]
    Warn,
    #[serde(alias = "error")]
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn to_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig / VersioningConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub include_state_in_logs: bool,
    pub log_to_console: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersioningConfig {
    pub capture_snapshots: bool,
    pub history_size: usize,
}

// ---------------------------------------------------------------------------
// CrudEngineConfig
// ---------------------------------------------------------------------------

/// Engine policy, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudEngineConfig {
    pub logging: LoggingConfig,
    pub versioning: VersioningConfig,
}

pub const DEV_CONFIG: CrudEngineConfig = CrudEngineConfig {
    logging: LoggingConfig {
        level: LogLevel::Debug,
        include_state_in_logs: true,
        log_to_console: true,
    },
    versioning: VersioningConfig {
        capture_snapshots: true,
        history_size: 100,
    },
};

pub const PROD_CONFIG: CrudEngineConfig = CrudEngineConfig {
    logging: LoggingConfig {
        level: LogLevel::Info,
        include_state_in_logs: false,
        log_to_console: false,
    },
    versioning: VersioningConfig {
        capture_snapshots: true,
        history_size: 20,
    },
};

impl Default for CrudEngineConfig {
    fn default() -> Self {
        DEV_CONFIG
    }
}

impl CrudEngineConfig {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Development => DEV_CONFIG,
            Profile::Production => PROD_CONFIG,
        }
    }

    /// Load `.claude/artifact-engine.yaml`, falling back to the development
    /// preset when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::engine_config_path(root);
        if !path.exists() {
            return Ok(DEV_CONFIG);
        }
        let data = std::fs::read_to_string(&path)?;
        Self::from_yaml(&data)
    }

    /// Parse a config file: an optional `profile` picks the base preset and
    /// any `logging`/`versioning` keys override it.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let file: ConfigFile = if data.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(data)?
        };
        let mut cfg = Self::for_profile(file.profile.unwrap_or_default());
        if let Some(l) = file.logging {
            if let Some(level) = l.level {
                cfg.logging.level = level;
            }
            if let Some(v) = l.include_state_in_logs {
                cfg.logging.include_state_in_logs = v;
            }
            if let Some(v) = l.log_to_console {
                cfg.logging.log_to_console = v;
            }
        }
        if let Some(v) = file.versioning {
            if let Some(capture) = v.capture_snapshots {
                cfg.versioning.capture_snapshots = capture;
            }
            if let Some(size) = v.history_size {
                cfg.versioning.history_size = size;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::engine_config_path(root), data.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.versioning.history_size == 0 {
            return Err(CrudError::InvalidConfig(
                "versioning.historySize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default)]
    logging: Option<LoggingOverrides>,
    #[serde(default)]
    versioning: Option<VersioningOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LoggingOverrides {
    level: Option<LogLevel>,
    include_state_in_logs: Option<bool>,
    log_to_console: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct VersioningOverrides {
    capture_snapshots: Option<bool>,
    history_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    #[serde(alias = "dev")]
    Development,
    #[serde(alias = "prod")]
    Production,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Profile {
    type Err = CrudError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(CrudError::InvalidConfig(format!("unknown profile '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn presets_differ_in_verbosity_and_retention() {
        assert_eq!(DEV_CONFIG.logging.level, LogLevel::Debug);
        assert!(DEV_CONFIG.logging.include_state_in_logs);
        assert_eq!(DEV_CONFIG.versioning.history_size, 100);
        assert_eq!(PROD_CONFIG.logging.level, LogLevel::Info);
        assert!(!PROD_CONFIG.logging.log_to_console);
        assert_eq!(PROD_CONFIG.versioning.history_size, 20);
        assert!(DEV_CONFIG.versioning.capture_snapshots);
        assert!(PROD_CONFIG.versioning.capture_snapshots);
    }

    #[test]
    fn missing_file_is_dev() {
        let dir = TempDir::new().unwrap();
        assert_eq!(CrudEngineConfig::load(dir.path()).unwrap(), DEV_CONFIG);
    }

    #[test]
    fn profile_with_overrides() {
        let cfg = CrudEngineConfig::from_yaml(
            "profile: production\nversioning:\n  historySize: 50\nlogging:\n  level: warn\n",
        )
        .unwrap();
        assert_eq!(cfg.versioning.history_size, 50);
        assert_eq!(cfg.logging.level, LogLevel::Warn);
        assert!(!cfg.logging.include_state_in_logs);
    }

    #[test]
    fn zero_history_rejected() {
        let err = CrudEngineConfig::from_yaml("versioning:\n  historySize: 0\n").unwrap_err();
        assert!(matches!(err, CrudError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(CrudEngineConfig::from_yaml("verbosity: 3\n").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        PROD_CONFIG.save(dir.path()).unwrap();
        let loaded = CrudEngineConfig::load(dir.path());
        // A saved config has no `profile` key; its explicit sections win.
        assert_eq!(loaded.unwrap(), PROD_CONFIG);
    }

    #[test]
    fn profile_names() {
        assert_eq!("prod".parse::<Profile>().unwrap(), Profile::Production);
        assert_eq!("development".parse::<Profile>().unwrap(), Profile::Development);
        assert!("staging".parse::<Profile>().is_err());
    }
}

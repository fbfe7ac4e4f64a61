//! Configuration file support for building a [`Logger`]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{
    exit_codes, ColorChoice, ExitCodeTable, Logger, LoggerBuilder, LoggerError, Severity,
};

/// Logger configuration, usually read from `~/.sevlog/config.toml`
///
/// ```toml
/// level = "warning"
/// log_file = "~/.sevlog/app.log"
/// console = true
/// color = "auto"
/// implicit_fatal_exit = "ERROR"
///
/// [exit_codes]
/// SHUTDOWN = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum severity to emit (default: info)
    #[serde(default = "default_level")]
    pub level: Severity,

    /// Log file to append to; `~` is expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Also print to the terminal (default: true)
    #[serde(default = "default_console")]
    pub console: bool,

    /// Console colors: "auto", "always" or "never"
    #[serde(default)]
    pub color: ColorChoice,

    /// Exit-code name used when FATAL is logged without one (default: "ERROR")
    #[serde(default = "default_implicit_fatal_exit")]
    pub implicit_fatal_exit: String,

    /// Extra or overriding exit codes, merged over ERROR/SHUTDOWN/SUCCESS
    #[serde(default)]
    pub exit_codes: BTreeMap<String, i32>,
}

fn default_level() -> Severity {
    Severity::Info
}

fn default_console() -> bool {
    true
}

fn default_implicit_fatal_exit() -> String {
    exit_codes::ERROR.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: None,
            console: default_console(),
            color: ColorChoice::default(),
            implicit_fatal_exit: default_implicit_fatal_exit(),
            exit_codes: BTreeMap::new(),
        }
    }
}

impl LoggerConfig {
    /// Load configuration from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Log file path with `~` expanded
    ///
    /// Paths that are not valid UTF-8 are returned unchanged.
    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file.as_ref().map(|path| match path.to_str() {
            Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
            None => path.clone(),
        })
    }

    /// Default table with the configured entries applied
    pub fn exit_code_table(&self) -> ExitCodeTable {
        ExitCodeTable::default().with_codes(
            self.exit_codes
                .iter()
                .map(|(name, code)| (name.as_str(), *code)),
        )
    }

    /// Builder preloaded with this configuration
    ///
    /// Writers and the terminator can still be replaced before building.
    pub fn builder(&self) -> LoggerBuilder {
        let mut builder = Logger::builder(self.level)
            .console(self.console)
            .color(self.color)
            .exit_codes(self.exit_code_table())
            .implicit_fatal_exit(self.implicit_fatal_exit.clone());
        if let Some(path) = self.resolved_log_file() {
            builder = builder.file(path);
        }
        builder
    }
}

impl Logger {
    /// Build a logger from a loaded configuration
    pub fn from_config(config: &LoggerConfig) -> Result<Self, LoggerError> {
        config.builder().build()
    }
}

/// Get the base configuration directory (~/.sevlog)
/// Falls back to ./.sevlog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".sevlog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".sevlog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

//! Configuration Management
//!
//! Settings live in `<root>/planrun.toml` (or a file given with `--config`).
//! A missing file means defaults; every section and key is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::execution_engine::ExitPolicy;

/// Config file name looked up in the project root
pub const CONFIG_FILE: &str = "planrun.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub execution: ExecutionConfig,
    pub shell: ShellConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Ask before each action
    pub interactive: bool,
    /// Exit non-zero when every action was skipped
    pub skipped_is_failure: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            skipped_is_failure: false,
        }
    }
}

impl ExecutionConfig {
    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy {
            skipped_is_failure: self.skipped_is_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub timeout_secs: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

impl ShellConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// HTML search endpoint, queried with `?q=<query>`
    pub search_endpoint: String,
    /// Results kept per query
    pub max_results: usize,
    /// Fetched text beyond this many characters is truncated
    pub max_content_chars: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("planrun/{}", env!("CARGO_PKG_VERSION")),
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 5,
            max_content_chars: 100_000,
        }
    }
}

impl WebConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    pub json: bool,
    /// Directory for a daily log file; empty disables the file sink
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: String::new(),
        }
    }
}

impl LoggingConfig {
    pub fn directory(&self) -> Option<PathBuf> {
        let dir = self.directory.trim();
        if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        }
    }
}

impl Config {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })
    }

    /// Load an explicit config file; it must exist
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `explicit` if given, else `<root>/planrun.toml` when present, else defaults
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        let default_path = root.join(CONFIG_FILE);
        if default_path.is_file() {
            Self::load_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.execution.interactive);
        assert_eq!(config.shell.timeout_secs, 300);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[execution]\nskipped_is_failure = true\n\n[web]\nmax_results = 3\n",
        )
        .unwrap();

        let config = Config::load(temp_dir.path(), None).unwrap();
        assert!(config.execution.skipped_is_failure);
        assert!(config.execution.interactive);
        assert_eq!(config.web.max_results, 3);
        assert_eq!(config.web.timeout_secs, 30);
        assert!(config.execution.exit_policy().skipped_is_failure);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        let result = Config::load(temp_dir.path(), Some(&missing));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = Config::from_toml_str("[shell]\ntimeout_secs = \"soon\"", Path::new("x.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_empty_log_directory_disables_sink() {
        assert!(LoggingConfig::default().directory().is_none());
    }
}

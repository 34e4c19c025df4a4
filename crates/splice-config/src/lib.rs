//! Configuration management for splice.
//!
//! Parses `splice.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `include.base_uri`
//! - `include.cache_dir`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the root base address for relative sources.
    pub base_uri: Option<String>,
    /// Override the disk cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Override the disk cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "splice.toml";

/// Default disk cache location, relative to the config directory.
const DEFAULT_CACHE_DIR: &str = ".splice/cache";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inclusion configuration (paths are relative strings from TOML).
    include: IncludeConfigRaw,
    /// Remote fetch configuration.
    pub fetch: FetchConfig,

    /// Resolved inclusion configuration (set after loading).
    #[serde(skip)]
    pub include_resolved: IncludeConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw inclusion configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IncludeConfigRaw {
    base_uri: Option<String>,
    cache: Option<bool>,
    cache_dir: Option<String>,
}

/// Resolved inclusion configuration.
#[derive(Debug, Default)]
pub struct IncludeConfig {
    /// Root base address: an absolute URI, or an absolute local directory.
    pub base_uri: String,
    /// Whether remote sources are cached on disk.
    pub cache_enabled: bool,
    /// Default disk cache directory.
    pub cache_dir: PathBuf,
}

/// Remote fetch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per remote fetch.
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl FetchConfig {
    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay between attempts.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`include.base_uri`").
        field: String,
        /// Error message (e.g., "${`DOCS_ROOT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Whether a configured base is a URI rather than a local path.
fn is_uri(value: &str) -> bool {
    value.contains("://")
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `splice.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_uri) = &settings.base_uri {
            self.include_resolved.base_uri.clone_from(base_uri);
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.include_resolved.cache_dir.clone_from(cache_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.include_resolved.cache_enabled = cache_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            include: IncludeConfigRaw::default(),
            fetch: FetchConfig::default(),
            include_resolved: IncludeConfig {
                base_uri: base.display().to_string(),
                cache_enabled: true,
                cache_dir: base.join(DEFAULT_CACHE_DIR),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_include()?;
        self.validate_fetch()?;
        Ok(())
    }

    /// Validate inclusion configuration.
    fn validate_include(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.include_resolved.base_uri, "include.base_uri")?;
        Ok(())
    }

    /// Validate fetch configuration.
    fn validate_fetch(&self) -> Result<(), ConfigError> {
        const MAX_ATTEMPTS: u32 = 10;

        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_attempts must be greater than 0".to_owned(),
            ));
        }
        if self.fetch.max_attempts > MAX_ATTEMPTS {
            return Err(ConfigError::Validation(format!(
                "fetch.max_attempts cannot exceed {MAX_ATTEMPTS}"
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref base_uri) = self.include.base_uri {
            self.include.base_uri = Some(expand::expand_env(base_uri, "include.base_uri")?);
        }
        if let Some(ref cache_dir) = self.include.cache_dir {
            self.include.cache_dir = Some(expand::expand_env(cache_dir, "include.cache_dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    ///
    /// URI bases are kept verbatim; local bases become absolute paths.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let base_uri = match self.include.base_uri.as_deref() {
            Some(uri) if is_uri(uri) => uri.to_owned(),
            Some(path) => config_dir.join(path).display().to_string(),
            None => config_dir.display().to_string(),
        };

        self.include_resolved = IncludeConfig {
            base_uri,
            cache_enabled: self.include.cache.unwrap_or(true),
            cache_dir: config_dir.join(
                self.include
                    .cache_dir
                    .as_deref()
                    .unwrap_or(DEFAULT_CACHE_DIR),
            ),
        };
    }
}

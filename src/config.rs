//! Configuration System
//!
//! Layered configuration (lowest to highest precedence): built-in defaults, the global
//! user file, workspace `config/config.toml`, `config/{BOOKWRIGHT_ENV}.toml`, and
//! `BOOKWRIGHT__*` environment variables. An explicit `--config FILE` replaces the file
//! discovery but keeps defaults and environment overrides.

use crate::cost::PricingConfig;
use crate::error::ApiError;
use crate::executor::ExecutorConfig;
use crate::logging::LoggingConfig;
use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType};

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookwrightConfig {
    /// Directory holding one sub-directory per book, relative to the workspace.
    #[serde(default = "default_books_root")]
    pub books_root: PathBuf,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_books_root() -> PathBuf {
    PathBuf::from("books")
}

impl Default for BookwrightConfig {
    fn default() -> Self {
        Self {
            books_root: default_books_root(),
            provider: ProviderConfig::default(),
            executor: ExecutorConfig::default(),
            pricing: PricingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String),
    Executor(String),
    Pricing(String),
    System(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Executor(msg) => write!(f, "Executor: {}", msg),
            ValidationError::Pricing(msg) => write!(f, "Pricing: {}", msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BookwrightConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.books_root.as_os_str().is_empty() {
            errors.push(ValidationError::System(
                "books_root cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.executor.validate() {
            errors.push(ValidationError::Executor(e));
        }
        if let Err(e) = self.pricing.validate() {
            errors.push(ValidationError::Pricing(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }

    /// Absolute books directory for a workspace.
    pub fn books_dir(&self, workspace_root: &Path) -> PathBuf {
        if self.books_root.is_absolute() {
            self.books_root.clone()
        } else {
            workspace_root.join(&self.books_root)
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace using the full discovery chain.
    pub fn load(workspace_root: &Path) -> Result<BookwrightConfig, ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(environment_source())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from one explicit file instead of discovery.
    pub fn load_from_file(path: &Path) -> Result<BookwrightConfig, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment_source())
            .build()?
            .try_deserialize()
    }

    /// Location of the global user configuration file.
    pub fn xdg_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}

fn environment_source() -> Environment {
    Environment::with_prefix("BOOKWRIGHT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

//! Error types for the book generation pipeline.
//!
//! Plan errors are fatal and surface before any generation starts. Generation and
//! storage errors are scoped to a single unit and wrapped in [`UnitFailure`] so a run
//! can record them and continue.

use std::path::PathBuf;
use thiserror::Error;

/// Plan loading and validation errors
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read plan {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plan {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{location}: missing required field '{field}'")]
    MissingField { location: String, field: String },

    #[error("{location}: bullet point list is empty")]
    EmptyBulletPoints { location: String },

    #[error("{location}: section list is empty")]
    EmptySections { location: String },

    #[error("{location}: part has no chapters")]
    EmptyChapters { location: String },

    #[error("Plan has no parts")]
    EmptyPlan,

    #[error("{location}: chapter declares both 'sections' and 'bullet_points'")]
    AmbiguousChapterBody { location: String },

    #[error("{location}: chapter declares neither 'sections' nor 'bullet_points'")]
    MissingChapterBody { location: String },

    #[error("{location}: invalid word range {min}-{max}")]
    InvalidWordRange { location: String, min: u32, max: u32 },

    #[error("Invalid slug '{0}': use lowercase letters, digits and '-' (max 50 chars)")]
    InvalidSlug(String),

    #[error("Unsupported book language: {0}")]
    UnsupportedLanguage(String),

    #[error("Duplicate destination path: {0}")]
    DuplicateDestination(PathBuf),
}

/// Content generator errors, classified for retry decisions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Generation failed: {0}")]
    Unknown(String),

    #[error("Generator returned empty text")]
    EmptyOutput,

    #[error("Response truncated: finish reason {0}")]
    Truncated(String),

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Transient failures that are worth another attempt after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited(_) | GenerationError::Timeout(_)
        )
    }
}

/// Output store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single unit did not reach the persisted state
#[derive(Debug, Error)]
pub enum UnitFailure {
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Top-level errors for CLI, configuration and provider setup
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("{summary}")]
    RunIncomplete { failed: usize, summary: String },
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

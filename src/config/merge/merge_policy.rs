//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override these key by key, so a file that only sets
/// `executor.concurrency` keeps every other executor default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("books_root", "books")?
        .set_default("provider.provider_type", "gemini")?
        .set_default("provider.model", "gemini-3-pro-preview")?
        .set_default("executor.concurrency", 3)?
        .set_default("executor.failure_policy", "continue")?
        .set_default("logging.level", "info")?
        .set_default("logging.output", "stderr")
}

//! Global config file source: $XDG_CONFIG_HOME/bookwright/config.toml or
//! ~/.config/bookwright/config.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use directories::BaseDirs;
use std::path::PathBuf;
use tracing::debug;

/// Path to the global config file, whether or not it exists.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("bookwright").join("config.toml"))
}

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if !path.is_file() {
        debug!(config_path = %path.display(), "No global configuration file");
        return Ok(builder);
    }
    let path = dunce::canonicalize(&path).unwrap_or(path);
    debug!(config_path = %path.display(), "Loading global configuration");
    Ok(builder.add_source(File::from(path).required(false)))
}

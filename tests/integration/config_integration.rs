//! Configuration layering as seen by a workspace on disk.

use bookwright::config::{ConfigLoader, ProviderType};
use bookwright::executor::FailurePolicy;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

// Tests in this file change process-wide environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();
    for (name, value) in vars {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    let result = f();
    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(&name, value),
            None => std::env::remove_var(&name),
        }
    }
    result
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_workspace_config_layers() {
    let temp = TempDir::new().unwrap();
    let xdg = temp.path().join("xdg");
    let workspace = temp.path().join("ws");
    write(
        &xdg.join("bookwright/config.toml"),
        r#"
[provider]
provider_type = "anthropic"
model = "claude-sonnet"
api_key_env = "MY_ANTHROPIC_KEY"

[pricing]
input_per_million = 3.0
"#,
    );
    write(
        &workspace.join("config/config.toml"),
        r#"
books_root = "manuscripts"

[executor]
failure_policy = "fail_fast"
"#,
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.to_str().unwrap())),
            ("BOOKWRIGHT_ENV", None),
            ("BOOKWRIGHT__EXECUTOR__CONCURRENCY", Some("6")),
        ],
        || ConfigLoader::load(&workspace).unwrap(),
    );

    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
    assert_eq!(config.provider.model, "claude-sonnet");
    assert_eq!(config.provider.api_key_env.as_deref(), Some("MY_ANTHROPIC_KEY"));
    assert_eq!(config.pricing.input_per_million, 3.0);
    assert_eq!(config.books_root, Path::new("manuscripts"));
    assert_eq!(config.books_dir(&workspace), workspace.join("manuscripts"));
    assert_eq!(config.executor.failure_policy, FailurePolicy::FailFast);
    assert_eq!(config.executor.concurrency, 6);
    assert!(config.validate().is_ok());
}

#[test]
fn test_explicit_file_skips_discovery() {
    let temp = TempDir::new().unwrap();
    let xdg = temp.path().join("xdg");
    let workspace = temp.path().join("ws");
    write(&xdg.join("bookwright/config.toml"), "books_root = \"from-global\"\n");
    write(&workspace.join("config/config.toml"), "books_root = \"from-workspace\"\n");
    let explicit = temp.path().join("explicit.toml");
    write(&explicit, "[executor]\nconcurrency = 1\n");

    let config = with_env(
        &[("XDG_CONFIG_HOME", Some(xdg.to_str().unwrap()))],
        || ConfigLoader::load_from_file(&explicit).unwrap(),
    );
    assert_eq!(config.books_root, Path::new("books"));
    assert_eq!(config.executor.concurrency, 1);
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp = TempDir::new().unwrap();
    let explicit = temp.path().join("bad.toml");
    write(
        &explicit,
        "[executor]\nconcurrency = 0\n\n[provider]\nprovider_type = \"local\"\nmodel = \"m\"\n",
    );
    let config = with_env(&[], || ConfigLoader::load_from_file(&explicit).unwrap());
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_malformed_toml_is_an_error() {
    let temp = TempDir::new().unwrap();
    let explicit = temp.path().join("broken.toml");
    write(&explicit, "[executor\nconcurrency = ");
    assert!(with_env(&[], || ConfigLoader::load_from_file(&explicit)).is_err());
}

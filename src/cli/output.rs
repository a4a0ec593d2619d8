//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Exit code for a run that finished with failed or undispatched units.
pub const EXIT_RUN_INCOMPLETE: i32 = 2;
/// Exit code for every other error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when a second Ctrl-C abandons in-flight units.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::RunIncomplete { failed, summary } => format!(
            "{}\n\n{} unit(s) failed. Re-run the same command to retry only the missing units.",
            summary, failed
        ),
        ApiError::ProviderNotConfigured(msg) => format!(
            "Provider not configured: {}\nSet the key in the environment or in config/config.toml.",
            msg
        ),
        other => other.to_string(),
    }
}

/// Process exit code for an error.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::RunIncomplete { .. } => EXIT_RUN_INCOMPLETE,
        _ => EXIT_FAILURE,
    }
}

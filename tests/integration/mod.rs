//! Integration tests for book generation, storage, configuration and the CLI.

mod cli_commands;
mod config_integration;
mod executor_run;
mod plan_loading;
mod store_atomicity;
mod test_utils;

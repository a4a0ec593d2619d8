//! Bookwright: resumable book generation from structured plans.
//!
//! A book plan (parts, chapters, sections, bullet outlines) is flattened into units,
//! each unit is generated by a language model and written atomically to its own file.
//! The file tree is the only record of progress, so interrupted runs resume by
//! re-running.

pub mod cli;
pub mod config;
pub mod cost;
pub mod error;
pub mod executor;
pub mod generator;
pub mod library;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod store;
pub mod unit;

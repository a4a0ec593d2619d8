//! Merge rules applied before any file or environment source.

pub mod merge_policy;

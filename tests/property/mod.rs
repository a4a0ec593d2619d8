//! Property-based tests for unit enumeration.

mod unit_paths;

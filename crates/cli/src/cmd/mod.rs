//! CLI command implementations

pub mod classify;
pub mod config;
pub mod fetch;
pub mod merge;
pub mod push;

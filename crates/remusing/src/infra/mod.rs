//! Infrastructure adapters for IO, grammar loading, and configuration.

pub mod config;
pub mod fs;
pub mod grammar;

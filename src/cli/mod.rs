//! CLI argument parsing and command dispatch.

pub mod args;
pub mod cache;
pub mod config;
pub mod fetch;

pub use args::{CacheCommand, Cli, Commands, ConfigCommand, FetchArgs, OutputFormat};

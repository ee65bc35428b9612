//! statcard - stat cards for public developer profiles
//!
//! Fetches WakaTime, CodeChef and LeetCode data through fallback endpoint
//! chains, normalizes it into stable records and serves it from a
//! stale-while-revalidate cache.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod sources;
pub mod storage;
pub mod util;

/// Test utilities, compiled for tests or with the `test-utils` feature.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ExitCode, Result, StatError};

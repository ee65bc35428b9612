//! Utility functions.

pub mod env;
pub mod time;

pub use time::{Clock, SystemClock, format_age, from_epoch_ms};

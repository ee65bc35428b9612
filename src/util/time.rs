//! Clock abstraction and time formatting utilities.

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Convert epoch milliseconds to a UTC timestamp (epoch on overflow).
#[must_use]
pub fn from_epoch_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Duration in milliseconds as a short age: `42s`, `5m`, `3h 10m`, `2d`.
#[must_use]
pub fn format_age(age_ms: i64) -> String {
    let seconds = (age_ms / 1000).max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d")
    } else if hours > 0 {
        let rem = minutes % 60;
        if rem == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {rem}m")
        }
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

//! Polling schedule parsing
//!
//! The polling interval is configured as a four-component duration string
//! `days:hours:minutes:seconds`. A malformed value falls back to the default
//! as a whole rather than being partially corrected.

use std::time::Duration;

use tracing::warn;

/// Default schedule string (one day).
pub const DEFAULT_SCHEDULE: &str = "01:00:00:00";

/// Seconds represented by [`DEFAULT_SCHEDULE`].
pub const DEFAULT_SCHEDULE_SECS: u64 = 86_400;

/// Seconds-per-unit factors for days, hours, minutes, seconds.
const FACTORS: [u64; 4] = [86_400, 3_600, 60, 1];

/// Parsed polling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    seconds: u64,
}

impl Schedule {
    /// Parse a `D:H:M:S` interval string.
    ///
    /// Validation, in order: the value must split into exactly four parts;
    /// every part but the first must be at most 60; every part must be a
    /// non-negative integer. Any violation reverts the entire value to
    /// [`DEFAULT_SCHEDULE`].
    pub fn parse(raw: &str) -> Schedule {
        match Self::try_parse(raw) {
            Some(schedule) => schedule,
            None => Schedule {
                seconds: DEFAULT_SCHEDULE_SECS,
            },
        }
    }

    fn try_parse(raw: &str) -> Option<Schedule> {
        let parts: Vec<&str> = raw.split(':').collect();

        if parts.len() != 4 {
            warn!("Invalid interval {:?}, setting to default", raw);
            return None;
        }

        let mut seconds: u64 = 0;

        for (index, part) in parts.iter().enumerate() {
            let value: i64 = match part.trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    warn!(
                        "Invalid interval component {:?} in {:?}, setting to default",
                        part, raw
                    );
                    return None;
                }
            };

            if index > 0 && value > 60 {
                warn!(
                    "Invalid interval, expected up to 60, actual: {}, setting to default",
                    value
                );
                return None;
            }

            if value < 0 {
                warn!(
                    "Invalid interval, {} is below minimum, setting to default",
                    value
                );
                return None;
            }

            seconds += FACTORS[index] * value as u64;
        }

        Some(Schedule { seconds })
    }

    /// Interval length in whole seconds.
    pub fn as_secs(&self) -> u64 {
        self.seconds
    }

    /// Interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            seconds: DEFAULT_SCHEDULE_SECS,
        }
    }
}

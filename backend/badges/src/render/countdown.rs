//! Time remaining until the campaign closes.

use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Ended,
    /// Whole units only; anything below a minute is truncated.
    Remaining { days: i64, hours: i64, minutes: i64 },
}

impl Countdown {
    pub fn between(end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = end - now;
        if remaining <= chrono::Duration::zero() {
            return Self::Ended;
        }
        Self::Remaining {
            days: remaining.num_days(),
            hours: remaining.num_hours() % 24,
            minutes: remaining.num_minutes() % 60,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ended => f.write_str("Ended"),
            Self::Remaining {
                days,
                hours,
                minutes,
            } => write!(f, "{days}d {hours}h {minutes}m"),
        }
    }
}

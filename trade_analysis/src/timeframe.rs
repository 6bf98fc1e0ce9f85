//! Fixed-width bar intervals and UTC bucket alignment.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`]. Every unit
//! has a fixed width in seconds, so bucket math is plain integer division
//! against the Unix epoch:
//!
//! - bucket start = floor(secs / width) * width
//! - bucket end   = start + width (exclusive)
//!
//! ```
//! use trade_analysis::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "5m".parse().unwrap();
//! assert_eq!(tf.amount().get(), 5);
//! assert_eq!(tf.unit(), TimeframeUnit::Minute);
//! assert_eq!(tf.to_string(), "5m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of seconds in a minute.
pub const SECS_PER_MINUTE: i64 = 60;
/// Number of seconds in an hour.
pub const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
/// Number of seconds in a day.
pub const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("empty timeframe")]
    Empty,

    #[error("invalid amount in {0:?}: must be a positive integer")]
    InvalidAmount(String),

    #[error("unknown timeframe unit {0:?} (expected m, h or D)")]
    UnknownUnit(String),

    #[error("{0} cannot be aligned to a bucket boundary")]
    OutOfRange(DateTime<Utc>),
}

/// Timeframe granularity. All units are UTC and fixed-width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeframeUnit {
    Minute,
    Hour,
    Day,
}

/// A timeframe = amount × unit (e.g., 1-Minute, 15-Minute, 1-Hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    amount: NonZeroU32,
    unit: TimeframeUnit,
}

impl Timeframe {
    pub const ONE_MINUTE: Timeframe = Timeframe {
        amount: NonZeroU32::MIN,
        unit: TimeframeUnit::Minute,
    };

    pub const fn new(amount: NonZeroU32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }
    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }
    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Bucket width in seconds.
    pub fn width_secs(&self) -> i64 {
        let unit = match self.unit {
            TimeframeUnit::Minute => SECS_PER_MINUTE,
            TimeframeUnit::Hour => SECS_PER_HOUR,
            TimeframeUnit::Day => SECS_PER_DAY,
        };
        unit * i64::from(self.amount.get())
    }

    pub fn width(&self) -> Duration {
        Duration::seconds(self.width_secs())
    }

    /// Start of the bucket containing `ts` (sub-second precision is dropped).
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError> {
        let width = self.width_secs();
        let start = ts.timestamp().div_euclid(width) * width;
        DateTime::from_timestamp(start, 0).ok_or(TimeframeError::OutOfRange(ts))
    }

    /// Exclusive end of the bucket containing `ts`.
    pub fn bucket_end_exclusive(&self, ts: DateTime<Utc>) -> Result<DateTime<Utc>, TimeframeError> {
        Ok(self.bucket_start(ts)? + self.width())
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

/// Display/parse for config ergonomics (`"1m"`, `"4h"`, `"1D"`)
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeframeUnit::Minute => "m",
            TimeframeUnit::Hour => "h",
            TimeframeUnit::Day => "D",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(unit) = s.chars().last() else {
            return Err(TimeframeError::Empty);
        };
        let digits = &s[..s.len() - unit.len_utf8()];
        let amount = digits
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| TimeframeError::InvalidAmount(s.to_string()))?;
        let unit = match unit {
            'm' => TimeframeUnit::Minute,
            'h' | 'H' => TimeframeUnit::Hour,
            'd' | 'D' => TimeframeUnit::Day,
            _ => return Err(TimeframeError::UnknownUnit(unit.to_string())),
        };
        Ok(Timeframe::new(amount, unit))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

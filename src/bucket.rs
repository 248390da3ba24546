//! UTC day buckets.
//!
//! Counters are partitioned by calendar day (UTC midnight Unix seconds) plus
//! one sentinel `all` bucket holding the lifetime aggregate.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};

use crate::error::{CounterError, Result};

/// Literal token used in storage keys for the lifetime bucket.
pub const ALL_TIME_TOKEN: &str = "all";

/// Seconds in one Unix day (Unix time has no leap seconds).
pub const DAY_SECONDS: i64 = 86_400;

/// One counter partition: a UTC calendar day or the lifetime aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// UTC-midnight-aligned Unix seconds identifying one calendar day.
    Day(i64),
    /// Sentinel lifetime bucket, rendered as the literal token `all`.
    AllTime,
}

impl Bucket {
    /// Bucket for the UTC day containing `ts` (Unix seconds).
    pub fn day_of(ts: i64) -> Result<Self> {
        Ok(Bucket::Day(day_start(ts)?))
    }

    /// Same bucket with day values floored to UTC midnight, so writers and
    /// readers agree on keys even when callers pass mid-day timestamps.
    pub fn canonical(self) -> Result<Self> {
        match self {
            Bucket::Day(ts) => Ok(Bucket::Day(day_start(ts)?)),
            Bucket::AllTime => Ok(Bucket::AllTime),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Day(ts) => write!(f, "{}", ts),
            Bucket::AllTime => f.write_str(ALL_TIME_TOKEN),
        }
    }
}

/// UTC midnight of the day containing `ts`.
pub fn day_start(ts: i64) -> Result<i64> {
    let dt = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
        CounterError::InvalidInput(format!("timestamp {} outside representable range", ts))
    })?;
    Ok(dt
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp())
}

/// Inclusive day-by-day walk from `start` to `end` at one-day stride.
///
/// Both endpoints are floored to UTC midnight first; an inverted range is
/// rejected before any store access.
pub fn day_range(start: i64, end: i64) -> Result<Vec<i64>> {
    let start = day_start(start)?;
    let end = day_start(end)?;
    if start > end {
        return Err(CounterError::InvalidInput(format!(
            "range start {} is after end {}",
            start, end
        )));
    }
    Ok((start..=end).step_by(DAY_SECONDS as usize).collect())
}

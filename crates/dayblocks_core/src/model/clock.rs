//! Wall-clock time of day in `HH:MM` form.
//!
//! # Responsibility
//! - Represent start times, habit times and due times as a validated value.
//! - Keep the persisted `"HH:MM"` string shape at the serde boundary.
//!
//! # Invariants
//! - `hour` is in `0..=23` and `minute` in `0..=59`.
//! - Display output is always zero padded (`"09:05"`).

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Minutes in one full day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// `00:00`.
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    /// Creates a time of day, rejecting out-of-range components.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ClockTimeError> {
        if hour > 23 || minute > 59 {
            return Err(ClockTimeError::OutOfRange { hour, minute });
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Builds a time from minutes since midnight (`0..1440`).
    pub fn from_minutes_since_midnight(minutes: u32) -> Result<Self, ClockTimeError> {
        Self::new(minutes / 60, minutes % 60)
    }

    /// Truncates a chrono time to minute precision.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn hour(self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minute)
    }

    pub fn minutes_since_midnight(self) -> u32 {
        self.hour() * 60 + self.minute()
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let Some((hour_text, minute_text)) = trimmed.split_once(':') else {
            return Err(ClockTimeError::InvalidFormat(trimmed.to_string()));
        };
        let digits_only = |text: &str| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(hour_text)
            || hour_text.len() > 2
            || minute_text.len() != 2
            || !digits_only(minute_text)
        {
            return Err(ClockTimeError::InvalidFormat(trimmed.to_string()));
        }

        let hour = hour_text
            .parse::<u32>()
            .map_err(|_| ClockTimeError::InvalidFormat(trimmed.to_string()))?;
        let minute = minute_text
            .parse::<u32>()
            .map_err(|_| ClockTimeError::InvalidFormat(trimmed.to_string()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Parse/construction errors for [`ClockTime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockTimeError {
    InvalidFormat(String),
    OutOfRange { hour: u32, minute: u32 },
}

impl Display for ClockTimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(value) => write!(f, "expected HH:MM time, got `{value}`"),
            Self::OutOfRange { hour, minute } => {
                write!(f, "time of day out of range: {hour}:{minute:02}")
            }
        }
    }
}

impl Error for ClockTimeError {}

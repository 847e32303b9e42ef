//! Run-window gate: "not allowed to run" intervals by weekday and time of day.
//!
//! A configuration is a list of [`RunWindow`]s. Running is permitted only when
//! the current moment matches none of them. A window whose end is before its
//! start spans midnight; the part after midnight belongs to the day the window
//! opened.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("unknown day filter: {0:?} (expected a weekday name, \"weekdays\" or \"weekend\")")]
    InvalidDay(String),

    #[error("invalid time of day: {0:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),
}

/// Which days a window applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayFilter {
    Day(Weekday),
    /// Monday through Friday.
    Weekdays,
    /// Saturday and Sunday.
    Weekend,
}

impl DayFilter {
    pub fn matches(self, day: Weekday) -> bool {
        match self {
            DayFilter::Day(d) => d == day,
            DayFilter::Weekdays => !matches!(day, Weekday::Sat | Weekday::Sun),
            DayFilter::Weekend => matches!(day, Weekday::Sat | Weekday::Sun),
        }
    }
}

impl FromStr for DayFilter {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekday" | "weekdays" => Ok(DayFilter::Weekdays),
            "weekend" | "weekends" => Ok(DayFilter::Weekend),
            other => other
                .parse::<Weekday>()
                .map(DayFilter::Day)
                .map_err(|_| WindowError::InvalidDay(s.to_string())),
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::Day(d) => write!(f, "{}", d),
            DayFilter::Weekdays => f.write_str("weekdays"),
            DayFilter::Weekend => f.write_str("weekend"),
        }
    }
}

impl TryFrom<String> for DayFilter {
    type Error = WindowError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DayFilter> for String {
    fn from(d: DayFilter) -> Self {
        d.to_string()
    }
}

/// Parses `HH:MM:SS` or `HH:MM`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, WindowError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| WindowError::InvalidTime(s.to_string()))
}

mod hms {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// One "not allowed to run" interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    pub days: DayFilter,
    #[serde(with = "hms")]
    pub start: NaiveTime,
    #[serde(with = "hms")]
    pub end: NaiveTime,
}

impl RunWindow {
    pub fn new(days: DayFilter, start: NaiveTime, end: NaiveTime) -> Self {
        Self { days, start, end }
    }

    pub fn spans_midnight(&self) -> bool {
        self.end < self.start
    }

    /// True if `now` falls strictly inside this window.
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        let t = i64::from(now.time().num_seconds_from_midnight());
        let start = i64::from(self.start.num_seconds_from_midnight());
        let mut end = i64::from(self.end.num_seconds_from_midnight());
        let today = now.weekday();

        if !self.spans_midnight() {
            return self.days.matches(today) && start < t && t < end;
        }

        end += SECS_PER_DAY;
        if self.days.matches(today) && start < t && t < end {
            return true;
        }
        // After midnight: still inside the window that opened yesterday.
        let shifted = t + SECS_PER_DAY;
        self.days.matches(today.pred()) && start < shifted && shifted < end
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.days,
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S")
        )
    }
}

/// Returns false if any window matches `now`. An empty set always permits.
pub fn is_run_permitted(windows: &[RunWindow], now: NaiveDateTime) -> bool {
    blocking_window(windows, now).is_none()
}

/// The first window that blocks running at `now`, if any.
pub fn blocking_window(windows: &[RunWindow], now: NaiveDateTime) -> Option<&RunWindow> {
    windows.iter().find(|w| w.matches(now))
}

/// Source of wall-clock time for the gate.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

//! Timestamped temperature readings.

use chrono::{Local, NaiveTime, Timelike};
use std::fmt;

use crate::unit::TemperatureUnit;

/// Wall-clock time of day with second resolution.
///
/// Rendered as zero-padded `HH:MM:SS` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(NaiveTime);

impl Timestamp {
    /// The current local time, truncated to whole seconds.
    pub fn now() -> Self {
        let now = Local::now().time();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Builds a timestamp from its components, or `None` if out of range.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
    }
}

/// A single sensor sample in the unit selected at sampling time.
///
/// Created once per sampling tick, serialized, then dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: Timestamp,
    temperature: f64,
    pub unit: TemperatureUnit,
}

impl Reading {
    /// Creates a reading from a Celsius sample, converting into `unit`.
    pub fn from_celsius(timestamp: Timestamp, celsius: f64, unit: TemperatureUnit) -> Self {
        Self {
            timestamp,
            temperature: unit.from_celsius(celsius),
            unit,
        }
    }

    /// Temperature in `self.unit`.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl fmt::Display for Reading {
    /// `HH:MM:SS <temperature to one decimal>`, without a line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.1}", self.timestamp, self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32, m: u32, s: u32) -> Timestamp {
        Timestamp::from_hms(h, m, s).unwrap()
    }

    #[test]
    fn test_timestamp_is_zero_padded() {
        assert_eq!(ts(7, 5, 3).to_string(), "07:05:03");
        assert_eq!(ts(23, 59, 59).to_string(), "23:59:59");
    }

    #[test]
    fn test_timestamp_rejects_out_of_range() {
        assert!(Timestamp::from_hms(24, 0, 0).is_none());
        assert!(Timestamp::from_hms(0, 60, 0).is_none());
    }

    #[test]
    fn test_now_has_no_subsecond_part() {
        let now = Timestamp::now();
        assert_eq!(now.to_string().len(), 8);
    }

    #[test]
    fn test_reading_celsius_format() {
        let r = Reading::from_celsius(ts(12, 0, 1), 25.0, TemperatureUnit::Celsius);
        assert_eq!(r.to_string(), "12:00:01 25.0");
    }

    #[test]
    fn test_reading_fahrenheit_format() {
        let r = Reading::from_celsius(ts(12, 0, 1), 25.0, TemperatureUnit::Fahrenheit);
        assert_eq!(r.temperature(), 77.0);
        assert_eq!(r.to_string(), "12:00:01 77.0");
    }

    #[test]
    fn test_reading_rounds_to_one_decimal() {
        let r = Reading::from_celsius(ts(0, 0, 0), 21.46, TemperatureUnit::Celsius);
        assert_eq!(r.to_string(), "00:00:00 21.5");
    }

    #[test]
    fn test_reading_negative() {
        let r = Reading::from_celsius(ts(1, 2, 3), -4.26, TemperatureUnit::Celsius);
        assert_eq!(r.to_string(), "01:02:03 -4.3");
    }
}

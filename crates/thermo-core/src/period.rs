//! Sampling period.

use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::error::{DomainError, DomainResult};

/// Interval, in whole seconds, between successive readings.
///
/// Always at least one second; a zero period is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(NonZeroU64);

impl Period {
    /// One second, the startup default.
    pub const DEFAULT: Period = Period(NonZeroU64::MIN);

    /// Creates a period, rejecting zero.
    pub fn new(secs: u64) -> DomainResult<Self> {
        NonZeroU64::new(secs)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidFieldValue {
                field: "period".to_string(),
                value: secs.to_string(),
                expected: "an integer >= 1".to_string(),
            })
    }

    /// Parses a decimal period as written on the wire or the command line.
    ///
    /// Negative values, zero and non-digits are rejected.
    pub fn parse(s: &str) -> DomainResult<Self> {
        let secs = s.parse::<u64>().map_err(|e| DomainError::ParseError {
            field: "period".to_string(),
            reason: format!("{s:?}: {e}"),
        })?;
        Self::new(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.get())
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

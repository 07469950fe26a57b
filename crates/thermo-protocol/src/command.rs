//! Inbound control commands.
//!
//! Matching is case-sensitive and exact on bytes. The checks mirror the
//! device's historical behaviour: each command has its own length guard
//! and they are tried in the order PERIOD, LOG, STOP, SCALE=C, SCALE=F,
//! START, OFF. The guards are mutually exclusive, so the first match is
//! the only match.

use std::fmt;

use thermo_core::{DomainError, Period, TemperatureUnit};
use thiserror::Error;

/// Lines this short are dropped before any matching.
pub const DEGENERATE_LINE_LEN: usize = 2;

const PERIOD_PREFIX: &[u8] = b"PERIOD=";
const LOG_PREFIX: &[u8] = b"LOG";

/// A validated control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PERIOD=<n>` - change the sampling period
    SetPeriod(Period),

    /// `LOG...` - free-form marker, recorded in the audit log only
    Log(String),

    /// `STOP` - withhold readings from the observer
    Stop,

    /// `SCALE=C` / `SCALE=F`
    SetScale(TemperatureUnit),

    /// `START` - resume readings
    Start,

    /// `OFF` - announce shutdown and stop the daemon
    Off,
}

impl Command {
    /// Parses one complete line (without its terminator).
    ///
    /// Returns `Ok(None)` for degenerate and unrecognized lines, which the
    /// protocol ignores. A well-formed `PERIOD=` prefix with an unusable
    /// value is an error.
    pub fn parse(line: &[u8]) -> Result<Option<Command>, CommandError> {
        let len = line.len();
        if len <= DEGENERATE_LINE_LEN {
            return Ok(None);
        }

        if len > PERIOD_PREFIX.len() && line.starts_with(PERIOD_PREFIX) {
            let value = line.get(PERIOD_PREFIX.len()..).unwrap_or_default();
            let text = String::from_utf8_lossy(value);
            return Period::parse(&text)
                .map(|p| Some(Command::SetPeriod(p)))
                .map_err(|source| CommandError::InvalidPeriod {
                    value: text.into_owned(),
                    source,
                });
        }

        if line.starts_with(LOG_PREFIX) {
            return Ok(Some(Command::Log(String::from_utf8_lossy(line).into_owned())));
        }

        let command = match line {
            b"STOP" => Command::Stop,
            b"SCALE=C" => Command::SetScale(TemperatureUnit::Celsius),
            b"SCALE=F" => Command::SetScale(TemperatureUnit::Fahrenheit),
            b"START" => Command::Start,
            b"OFF" => Command::Off,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    /// Returns true if the command can be undone by a later command.
    pub fn is_reversible(&self) -> bool {
        !matches!(self, Command::Off)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetPeriod(p) => write!(f, "PERIOD={}", p.as_secs()),
            Command::Log(text) => f.write_str(text),
            Command::Stop => f.write_str("STOP"),
            Command::SetScale(unit) => write!(f, "SCALE={unit}"),
            Command::Start => f.write_str("START"),
            Command::Off => f.write_str("OFF"),
        }
    }
}

/// Errors for lines that look like a command but cannot be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Invalid period {value:?}: {source}")]
    InvalidPeriod {
        value: String,
        #[source]
        source: DomainError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Command> {
        Command::parse(line.as_bytes()).unwrap()
    }

    #[test]
    fn test_exact_commands() {
        assert_eq!(parse("STOP"), Some(Command::Stop));
        assert_eq!(parse("START"), Some(Command::Start));
        assert_eq!(parse("OFF"), Some(Command::Off));
        assert_eq!(
            parse("SCALE=C"),
            Some(Command::SetScale(TemperatureUnit::Celsius))
        );
        assert_eq!(
            parse("SCALE=F"),
            Some(Command::SetScale(TemperatureUnit::Fahrenheit))
        );
    }

    #[test]
    fn test_period() {
        assert_eq!(
            parse("PERIOD=3"),
            Some(Command::SetPeriod(Period::new(3).unwrap()))
        );
        assert_eq!(
            parse("PERIOD=120"),
            Some(Command::SetPeriod(Period::new(120).unwrap()))
        );
    }

    #[test]
    fn test_period_requires_a_value() {
        // "PERIOD=" alone fails the length guard and is simply unrecognized
        assert_eq!(parse("PERIOD="), None);
    }

    #[test]
    fn test_invalid_period_values() {
        for line in ["PERIOD=0", "PERIOD=-1", "PERIOD=abc", "PERIOD=5x"] {
            let err = Command::parse(line.as_bytes()).unwrap_err();
            assert!(matches!(err, CommandError::InvalidPeriod { .. }), "{line}");
        }
    }

    #[test]
    fn test_log_prefix() {
        assert_eq!(parse("LOG"), Some(Command::Log("LOG".to_string())));
        assert_eq!(
            parse("LOG sensor moved to window"),
            Some(Command::Log("LOG sensor moved to window".to_string()))
        );
    }

    #[test]
    fn test_degenerate_lines() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("\r"), None);
        assert_eq!(parse("OF"), None);
    }

    #[test]
    fn test_exact_match_is_byte_exact() {
        assert_eq!(parse(" STOP"), None);
        assert_eq!(parse("STOP "), None);
        assert_eq!(parse("stop"), None);
        assert_eq!(parse("STOPS"), None);
        assert_eq!(parse("OFF\r"), None);
        assert_eq!(parse("SCALE=K"), None);
        assert_eq!(parse("scale=c"), None);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(parse("HELLO"), None);
        assert_eq!(parse("LO G"), None);
    }

    #[test]
    fn test_non_utf8_is_ignored() {
        assert_eq!(Command::parse(&[0xff, 0xfe, 0xfd]).unwrap(), None);
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Command::SetPeriod(Period::new(4).unwrap()).to_string(), "PERIOD=4");
        assert_eq!(
            Command::SetScale(TemperatureUnit::Celsius).to_string(),
            "SCALE=C"
        );
        assert_eq!(Command::Off.to_string(), "OFF");
    }

    #[test]
    fn test_only_off_is_irreversible() {
        assert!(!Command::Off.is_reversible());
        assert!(Command::Stop.is_reversible());
        assert!(Command::Start.is_reversible());
    }
}

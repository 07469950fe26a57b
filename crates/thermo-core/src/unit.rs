//! Temperature scale selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Temperature scale used for emitted readings.
///
/// Parsed from `--scale` and the config file as `C` or `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C", alias = "c")]
    Celsius,

    #[default]
    #[serde(rename = "F", alias = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Converts a Celsius value into this unit.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Single-letter symbol, as used on the wire (`SCALE=C`).
    pub fn symbol(self) -> char {
        match self {
            Self::Celsius => 'C',
            Self::Fahrenheit => 'F',
        }
    }

    pub(crate) fn to_bits(self) -> u8 {
        match self {
            Self::Celsius => 0,
            Self::Fahrenheit => 1,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Celsius,
            _ => Self::Fahrenheit,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" | "c" => Ok(Self::Celsius),
            "F" | "f" => Ok(Self::Fahrenheit),
            other => Err(DomainError::InvalidFieldValue {
                field: "scale".to_string(),
                value: other.to_string(),
                expected: "C or F".to_string(),
            }),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(0.0), 32.0);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(100.0), 212.0);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(25.0), 77.0);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(-40.0), -40.0);
    }

    #[test]
    fn test_celsius_is_identity() {
        assert_eq!(TemperatureUnit::Celsius.from_celsius(21.5), 21.5);
    }

    #[test]
    fn test_default_is_fahrenheit() {
        assert_eq!(TemperatureUnit::default(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_parse() {
        assert_eq!("C".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Celsius);
        assert_eq!("f".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Fahrenheit);
        assert!("K".parse::<TemperatureUnit>().is_err());
        assert!("celsius".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_bits_roundtrip_both_units() {
        for unit in [TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit] {
            assert_eq!(TemperatureUnit::from_bits(unit.to_bits()), unit);
        }
    }

    #[test]
    fn test_deserialize_from_config_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            scale: TemperatureUnit,
        }

        let w: Wrapper = toml::from_str("scale = \"C\"").unwrap();
        assert_eq!(w.scale, TemperatureUnit::Celsius);
    }
}

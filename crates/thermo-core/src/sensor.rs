//! Temperature sensors.
//!
//! The daemon only sees [`TemperatureSensor`]: one call returning the
//! current temperature in Celsius. Two implementations are provided:
//!
//! - [`Thermistor`] - an NTC thermistor behind a 12-bit ADC, sampled through
//!   the Linux IIO sysfs interface
//! - [`FixedSensor`] - a constant value, for simulation and tests

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::SensorError;

/// IIO attribute for ADC channel 0 on BeagleBone-class boards.
pub const DEFAULT_ADC_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_voltage0_raw";

/// Source of temperature samples.
pub trait TemperatureSensor: Send {
    /// Reads the current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> Result<f64, SensorError>;
}

/// Beta-model parameters for an NTC thermistor in a voltage divider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorModel {
    /// Beta coefficient (K)
    pub beta: f64,
    /// Resistance at the nominal temperature (ohms)
    pub nominal_resistance: f64,
    /// Nominal temperature (K)
    pub nominal_kelvin: f64,
    /// Full-scale ADC value
    pub adc_max: u32,
}

impl ThermistorModel {
    /// Grove temperature sensor v1.2 (NCP18WF104F03RC) on a 12-bit ADC.
    pub const GROVE: ThermistorModel = ThermistorModel {
        beta: 4275.0,
        nominal_resistance: 100_000.0,
        nominal_kelvin: 298.15,
        adc_max: 4095,
    };

    /// Converts a raw ADC sample to degrees Celsius.
    ///
    /// A sample of 0 (open circuit) or full scale (short) has no finite
    /// resistance and is rejected.
    pub fn celsius_from_raw(&self, raw: u32) -> Result<f64, SensorError> {
        if raw == 0 || raw >= self.adc_max {
            return Err(SensorError::OutOfRange {
                raw,
                max: self.adc_max,
            });
        }

        let ratio = f64::from(self.adc_max) / f64::from(raw) - 1.0;
        let resistance = self.nominal_resistance * ratio;
        let inverse_kelvin =
            (resistance / self.nominal_resistance).ln() / self.beta + 1.0 / self.nominal_kelvin;

        Ok(1.0 / inverse_kelvin - 273.15)
    }
}

impl Default for ThermistorModel {
    fn default() -> Self {
        Self::GROVE
    }
}

/// Thermistor sampled through a sysfs ADC attribute.
#[derive(Debug, Clone)]
pub struct Thermistor {
    adc_path: PathBuf,
    model: ThermistorModel,
}

impl Thermistor {
    /// Creates a thermistor reader with the Grove model.
    pub fn new(adc_path: impl Into<PathBuf>) -> Self {
        Self::with_model(adc_path, ThermistorModel::GROVE)
    }

    pub fn with_model(adc_path: impl Into<PathBuf>, model: ThermistorModel) -> Self {
        Self {
            adc_path: adc_path.into(),
            model,
        }
    }

    pub fn adc_path(&self) -> &Path {
        &self.adc_path
    }

    fn read_raw(&self) -> Result<u32, SensorError> {
        let content = fs::read_to_string(&self.adc_path).map_err(|e| SensorError::Read {
            path: self.adc_path.clone(),
            reason: e.to_string(),
        })?;

        content
            .trim()
            .parse::<u32>()
            .map_err(|_| SensorError::Malformed {
                path: self.adc_path.clone(),
                content: content.trim().to_string(),
            })
    }
}

impl TemperatureSensor for Thermistor {
    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        let raw = self.read_raw()?;
        let celsius = self.model.celsius_from_raw(raw)?;
        trace!(raw, celsius, "Thermistor sample");
        Ok(celsius)
    }
}

/// Sensor that always reports the same temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSensor {
    celsius: f64,
}

impl FixedSensor {
    pub fn new(celsius: f64) -> Self {
        Self { celsius }
    }
}

impl TemperatureSensor for FixedSensor {
    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        Ok(self.celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_midscale_is_nominal_temperature() {
        // 4095 / 2048 - 1 is within 0.05% of 1.0, i.e. R ~= R0
        let c = ThermistorModel::GROVE.celsius_from_raw(2048).unwrap();
        assert!((c - 25.0).abs() < 0.05, "got {c}");
    }

    #[test]
    fn test_higher_sample_is_warmer() {
        let model = ThermistorModel::GROVE;
        let cool = model.celsius_from_raw(1500).unwrap();
        let warm = model.celsius_from_raw(2500).unwrap();
        assert!(warm > cool);
    }

    #[test]
    fn test_extremes_rejected() {
        let model = ThermistorModel::GROVE;
        assert_eq!(
            model.celsius_from_raw(0),
            Err(SensorError::OutOfRange { raw: 0, max: 4095 })
        );
        assert!(model.celsius_from_raw(4095).is_err());
        assert!(model.celsius_from_raw(9000).is_err());
    }

    #[test]
    fn test_thermistor_reads_sysfs_attribute() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2048").unwrap();

        let mut sensor = Thermistor::new(file.path());
        let c = sensor.read_celsius().unwrap();
        assert!((c - 25.0).abs() < 0.05);
    }

    #[test]
    fn test_thermistor_malformed_sample() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n/a").unwrap();

        let mut sensor = Thermistor::new(file.path());
        assert!(matches!(
            sensor.read_celsius(),
            Err(SensorError::Malformed { .. })
        ));
    }

    #[test]
    fn test_thermistor_missing_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let mut sensor = Thermistor::new(dir.path().join("in_voltage0_raw"));
        assert!(matches!(sensor.read_celsius(), Err(SensorError::Read { .. })));
    }

    #[test]
    fn test_fixed_sensor() {
        let mut sensor = FixedSensor::new(25.0);
        assert_eq!(sensor.read_celsius().unwrap(), 25.0);
        assert_eq!(sensor.read_celsius().unwrap(), 25.0);
    }
}

//! thermo-core - Shared domain types for the thermod daemon
//!
//! This crate provides the types shared between the line protocol
//! (`thermo-protocol`) and the daemon (`thermod`): temperature units,
//! sampling periods, readings, the cross-task device state, and the
//! sensor seam.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod period;
pub mod reading;
pub mod sensor;
pub mod state;
pub mod unit;

// Re-exports for convenience
pub use error::{DomainError, DomainResult, SensorError};
pub use period::Period;
pub use reading::{Reading, Timestamp};
pub use sensor::{FixedSensor, TemperatureSensor, Thermistor, ThermistorModel, DEFAULT_ADC_PATH};
pub use state::{DeviceSettings, DeviceSnapshot, DeviceState};
pub use unit::TemperatureUnit;

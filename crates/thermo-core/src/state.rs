//! Device state shared between the sampler and the dispatcher.
//!
//! Every field is an independent atomic so the sampler can read a
//! consistent value of each without taking a lock. Writes come only
//! from the command engine; `shutdown` is monotone (false -> true).

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use crate::period::Period;
use crate::unit::TemperatureUnit;

/// Initial values resolved from configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceSettings {
    pub period: Period,
    pub unit: TemperatureUnit,
}

/// Point-in-time copy of [`DeviceState`], for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub period: Period,
    pub unit: TemperatureUnit,
    pub suppressed: bool,
    pub shutdown_requested: bool,
}

/// Process-wide mutable device state.
///
/// Shared via `Arc` between the sampler task and the dispatcher.
#[derive(Debug)]
pub struct DeviceState {
    period_secs: AtomicU64,
    unit: AtomicU8,
    suppressed: AtomicBool,
    shutdown: AtomicBool,
}

impl DeviceState {
    pub fn new(settings: DeviceSettings) -> Self {
        Self {
            period_secs: AtomicU64::new(settings.period.as_secs()),
            unit: AtomicU8::new(settings.unit.to_bits()),
            suppressed: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn period(&self) -> Period {
        Period::new(self.period_secs.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set_period(&self, period: Period) {
        self.period_secs.store(period.as_secs(), Ordering::Release);
    }

    pub fn unit(&self) -> TemperatureUnit {
        TemperatureUnit::from_bits(self.unit.load(Ordering::Acquire))
    }

    pub fn set_unit(&self, unit: TemperatureUnit) {
        self.unit.store(unit.to_bits(), Ordering::Release);
    }

    /// True while readings are withheld from the observer.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Acquire)
    }

    pub fn set_suppressed(&self, suppressed: bool) {
        self.suppressed.store(suppressed, Ordering::Release);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Marks shutdown as requested.
    ///
    /// Returns `true` only for the call that performed the transition,
    /// so the caller can emit the shutdown notice exactly once.
    pub fn request_shutdown(&self) -> bool {
        !self.shutdown.swap(true, Ordering::AcqRel)
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            period: self.period(),
            unit: self.unit(),
            suppressed: self.is_suppressed(),
            shutdown_requested: self.shutdown_requested(),
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(DeviceSettings::default())
    }
}

//! Outbound frames written by the daemon.

use std::fmt;

use thermo_core::{Reading, Timestamp};

/// Numeric identifier announced once on encrypted transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line the daemon sends to the observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// `HH:MM:SS <temp>`
    Reading(Reading),

    /// `HH:MM:SS SHUTDOWN`
    Shutdown(Timestamp),

    /// `ID=<n>`
    Identity(DeviceId),
}

impl Outbound {
    pub fn reading(reading: Reading) -> Self {
        Self::Reading(reading)
    }

    /// Shutdown notice stamped with the current time.
    pub fn shutdown() -> Self {
        Self::Shutdown(Timestamp::now())
    }

    pub fn identity(id: DeviceId) -> Self {
        Self::Identity(id)
    }

    /// Renders the frame with its `\n` terminator.
    pub fn to_wire(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outbound::Reading(reading) => write!(f, "{reading}"),
            Outbound::Shutdown(ts) => write!(f, "{ts} SHUTDOWN"),
            Outbound::Identity(id) => write!(f, "ID={id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_core::TemperatureUnit;

    #[test]
    fn test_reading_frame() {
        let ts = Timestamp::from_hms(9, 30, 0).unwrap();
        let frame = Outbound::reading(Reading::from_celsius(ts, 25.0, TemperatureUnit::Celsius));
        assert_eq!(frame.to_wire(), "09:30:00 25.0\n");
    }

    #[test]
    fn test_shutdown_frame() {
        let ts = Timestamp::from_hms(17, 4, 59).unwrap();
        assert_eq!(Outbound::Shutdown(ts).to_wire(), "17:04:59 SHUTDOWN\n");
    }

    #[test]
    fn test_shutdown_now_shape() {
        let wire = Outbound::shutdown().to_wire();
        assert_eq!(wire.len(), "HH:MM:SS SHUTDOWN\n".len());
        assert!(wire.ends_with(" SHUTDOWN\n"));
    }

    #[test]
    fn test_identity_frame() {
        assert_eq!(
            Outbound::identity(DeviceId(123456789)).to_wire(),
            "ID=123456789\n"
        );
    }
}

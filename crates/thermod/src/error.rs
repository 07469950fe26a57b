//! Error types for the thermod daemon.
//!
//! Two layers, matching the two phases of the process:
//!
//! - [`StartupError`] - configuration, audit-log, hardware and transport
//!   bootstrap faults; the daemon exits before entering its core loop
//! - [`DaemonError`] - steady-state faults; every variant is fatal
//!
//! Unrecognized control lines are not errors and never reach these types.

use std::io;

use thermo_protocol::LineError;
use thiserror::Error;

use crate::audit::AuditError;
use crate::config::ConfigError;
use crate::transport::TransportError;

/// Fatal faults raised while the daemon is running.
#[derive(Error, Debug)]
pub enum DaemonError {
    /// Writing to the observer failed; the data channel is gone
    #[error("Transport write failed: {0}")]
    TransportWrite(#[source] io::Error),

    /// Reading from the control channel failed
    #[error("Transport read failed: {0}")]
    TransportRead(#[source] io::Error),

    /// The observer hung up
    #[error("Control channel closed by peer")]
    TransportClosed,

    /// A control line exceeded the line buffer
    #[error(transparent)]
    Line(#[from] LineError),

    /// A shutdown interrupt source reported an error or hangup
    #[error("Shutdown interrupt {name} failed: {reason}")]
    Interrupt { name: &'static str, reason: String },

    /// The sampler returned while the dispatcher was still running
    #[error("Sampler stopped unexpectedly")]
    SamplerStopped,

    /// The sampler task panicked or was aborted
    #[error("Sampler task failed: {0}")]
    SamplerJoin(String),
}

/// Faults raised before the core starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Sensor or GPIO setup failed
    #[error("Failed to initialise {device}: {reason}")]
    Hardware { device: String, reason: String },
}

impl StartupError {
    /// Process exit status for this fault.
    ///
    /// Hardware initialisation faults exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Hardware { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_exit_code() {
        let err = StartupError::Hardware {
            device: "button".to_string(),
            reason: "no such file".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("button"));
    }

    #[test]
    fn test_config_exit_code() {
        let err = StartupError::from(ConfigError::MissingTlsField { field: "id" });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_line_error_is_transparent() {
        let err = DaemonError::from(LineError::Overflow { capacity: 100 });
        assert!(err.to_string().contains("100 bytes"));
    }
}

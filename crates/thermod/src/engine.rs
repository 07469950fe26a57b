//! Command engine: validates control lines and applies them to the
//! device state.
//!
//! This is the only writer of [`DeviceState`]. Every accepted command is
//! recorded verbatim in the audit log before it takes effect; ignored
//! and rejected lines are not recorded.

use std::sync::Arc;

use thermo_core::DeviceState;
use thermo_protocol::{Command, CommandError, Outbound, DEGENERATE_LINE_LEN};
use tracing::{debug, info, warn};

use crate::error::DaemonError;
use crate::interrupt::InterruptSource;
use crate::outbox::Outbox;

/// Why the daemon shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// `OFF` on the control channel
    OffCommand,
    /// Button press or termination signal
    Interrupt(InterruptSource),
}

/// What happened to one control line.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Accepted, audited and applied
    Applied(Command),
    /// Too short to be a command
    Degenerate,
    /// Not a known command; ignored for forward compatibility
    Unrecognized,
    /// Looked like a command but carried an unusable value
    Rejected(CommandError),
    /// Arrived after shutdown was already requested
    AfterShutdown,
}

/// Applies control lines to shared state.
#[derive(Clone)]
pub struct CommandEngine {
    state: Arc<DeviceState>,
    outbox: Arc<Outbox>,
}

impl CommandEngine {
    pub fn new(state: Arc<DeviceState>, outbox: Arc<Outbox>) -> Self {
        Self { state, outbox }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.state.shutdown_requested()
    }

    /// Handles one complete control line (without terminator).
    ///
    /// Only a transport failure while announcing shutdown is an error.
    pub async fn apply(&self, line: &[u8]) -> Result<Disposition, DaemonError> {
        if line.len() <= DEGENERATE_LINE_LEN {
            return Ok(Disposition::Degenerate);
        }

        if self.state.shutdown_requested() {
            debug!(line = %String::from_utf8_lossy(line), "Shutdown in progress, ignoring line");
            return Ok(Disposition::AfterShutdown);
        }

        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!(line = %String::from_utf8_lossy(line), "Ignoring unrecognized command");
                return Ok(Disposition::Unrecognized);
            }
            Err(e) => {
                warn!(error = %e, "Rejected command");
                return Ok(Disposition::Rejected(e));
            }
        };

        self.outbox.audit(line).await;

        match &command {
            Command::SetPeriod(period) => self.state.set_period(*period),
            Command::Log(_) => {}
            Command::Stop => self.state.set_suppressed(true),
            Command::SetScale(unit) => self.state.set_unit(*unit),
            Command::Start => self.state.set_suppressed(false),
            Command::Off => self.shutdown(ShutdownCause::OffCommand).await?,
        }

        info!(command = %command, "Applied command");
        Ok(Disposition::Applied(command))
    }

    /// Shuts down on behalf of an interrupt source.
    pub async fn force_shutdown(&self, source: InterruptSource) -> Result<(), DaemonError> {
        self.shutdown(ShutdownCause::Interrupt(source)).await
    }

    /// Sets the shutdown flag and announces it once.
    ///
    /// The flag is set before the notice is queued so the sampler, which
    /// checks it under the outbox lock, cannot emit after the notice.
    async fn shutdown(&self, cause: ShutdownCause) -> Result<(), DaemonError> {
        if !self.state.request_shutdown() {
            debug!(?cause, "Shutdown already requested");
            return Ok(());
        }

        info!(?cause, "Shutdown requested");
        self.outbox
            .announce(&Outbound::shutdown())
            .await
            .map_err(DaemonError::TransportWrite)
    }
}

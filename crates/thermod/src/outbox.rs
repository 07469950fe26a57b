//! Single-writer gate for the observer channel and the audit log.
//!
//! The sampler and the dispatcher both produce output. Every write goes
//! through one [`Outbox`], whose lock serializes whole lines so a
//! `SHUTDOWN` notice can never interleave with a reading, and keeps the
//! audit log in the same order as the transport.

use std::io;

use thermo_core::{DeviceState, Reading};
use thermo_protocol::Outbound;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::audit::AuditLog;
use crate::transport::BoxedWriter;

struct OutboxInner {
    transport: BoxedWriter,
    audit: Option<AuditLog>,
}

impl OutboxInner {
    async fn send(&mut self, wire: &[u8]) -> io::Result<()> {
        self.transport.write_all(wire).await?;
        self.transport.flush().await
    }

    /// Audit failures are reported and otherwise ignored; the log is
    /// secondary to the observer channel.
    async fn record(&mut self, wire: &[u8]) {
        if let Some(log) = self.audit.as_mut() {
            if let Err(e) = log.append(wire).await {
                warn!(
                    path = %log.path().display(),
                    error = %e,
                    "Failed to append to audit log"
                );
            }
        }
    }
}

/// Serialized writer shared by the sampler and the command engine.
pub struct Outbox {
    inner: Mutex<OutboxInner>,
}

impl Outbox {
    pub fn new(transport: BoxedWriter, audit: Option<AuditLog>) -> Self {
        Self {
            inner: Mutex::new(OutboxInner { transport, audit }),
        }
    }

    /// Publishes a reading to the observer and the audit log.
    ///
    /// The shutdown flag is checked while the lock is held, so once the
    /// shutdown notice has been queued no further reading can follow it.
    /// Returns `false` if the reading was dropped for that reason.
    pub async fn publish_reading(&self, state: &DeviceState, reading: &Reading) -> io::Result<bool> {
        let mut inner = self.inner.lock().await;
        if state.shutdown_requested() {
            return Ok(false);
        }

        let wire = Outbound::reading(*reading).to_wire();
        inner.send(wire.as_bytes()).await?;
        inner.record(wire.as_bytes()).await;
        debug!(reading = %reading, "Emitted reading");
        Ok(true)
    }

    /// Sends a frame to the observer and records it in the audit log.
    pub async fn announce(&self, frame: &Outbound) -> io::Result<()> {
        let wire = frame.to_wire();
        let mut inner = self.inner.lock().await;
        inner.send(wire.as_bytes()).await?;
        inner.record(wire.as_bytes()).await;
        Ok(())
    }

    /// Records an accepted control line verbatim in the audit log.
    pub async fn audit(&self, line: &[u8]) {
        let mut entry = Vec::with_capacity(line.len() + 1);
        entry.extend_from_slice(line);
        entry.push(b'\n');

        self.inner.lock().await.record(&entry).await;
    }

    pub async fn flush(&self) -> io::Result<()> {
        self.inner.lock().await.transport.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_core::{TemperatureUnit, Timestamp};
    use tokio::io::AsyncReadExt;

    fn reading() -> Reading {
        let ts = Timestamp::from_hms(10, 0, 0).unwrap();
        Reading::from_celsius(ts, 25.0, TemperatureUnit::Celsius)
    }

    #[tokio::test]
    async fn test_reading_goes_to_transport_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::open(&path).await.unwrap();

        let (writer, mut observer) = tokio::io::duplex(1024);
        let outbox = Outbox::new(Box::new(writer), Some(audit));
        let state = DeviceState::default();

        assert!(outbox.publish_reading(&state, &reading()).await.unwrap());

        let mut buf = vec![0u8; 14];
        observer.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, b"10:00:00 25.0\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "10:00:00 25.0\n");
    }

    #[tokio::test]
    async fn test_no_reading_after_shutdown() {
        let (writer, _observer) = tokio::io::duplex(1024);
        let outbox = Outbox::new(Box::new(writer), None);
        let state = DeviceState::default();
        state.request_shutdown();

        assert!(!outbox.publish_reading(&state, &reading()).await.unwrap());
    }

    #[tokio::test]
    async fn test_audit_only_touches_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::open(&path).await.unwrap();

        let (writer, observer) = tokio::io::duplex(1024);
        let outbox = Outbox::new(Box::new(writer), Some(audit));
        outbox.audit(b"LOG hello").await;

        drop(outbox);
        let mut observed = String::new();
        let mut observer = observer;
        observer.read_to_string(&mut observed).await.unwrap();
        assert!(observed.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "LOG hello\n");
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let (writer, observer) = tokio::io::duplex(64);
        drop(observer);
        let outbox = Outbox::new(Box::new(writer), None);

        let err = outbox.announce(&Outbound::shutdown()).await;
        assert!(err.is_err());
    }
}

//! Inbound control dispatcher.
//!
//! The dispatcher is the daemon's second unit of execution. It waits on
//! two sources at once, the shutdown interrupt channel and the control
//! transport. Interrupts are checked first on every wake so a pressed
//! button is never starved by a chatty observer.
//!
//! Control bytes are accumulated into lines; each complete line is handed
//! to the [`CommandEngine`]. The loop ends once shutdown has been
//! requested by either path.

use thermo_protocol::LineBuffer;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::engine::{CommandEngine, ShutdownCause};
use crate::error::DaemonError;
use crate::interrupt::InterruptEvent;

/// Bytes requested from the transport per read.
pub const READ_CHUNK: usize = 1000;

/// Where the dispatcher is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Blocked on the transport and the interrupt channel
    Waiting,
    /// Draining bytes into the line buffer
    Reading,
    /// Applying a complete line
    Dispatching,
    /// Shutdown requested; the loop has exited
    ShuttingDown,
}

/// Reason the dispatcher woke.
enum Wake {
    Interrupt(InterruptEvent),
    InterruptsClosed,
    Bytes(usize),
}

/// Reads control lines and applies them until shutdown.
pub struct Dispatcher<R> {
    reader: R,
    lines: LineBuffer,
    engine: CommandEngine,
    interrupts: mpsc::Receiver<InterruptEvent>,
    interrupts_open: bool,
    state: DispatchState,
}

impl<R: AsyncRead + Unpin> Dispatcher<R> {
    pub fn new(
        reader: R,
        engine: CommandEngine,
        interrupts: mpsc::Receiver<InterruptEvent>,
    ) -> Self {
        Self {
            reader,
            lines: LineBuffer::new(),
            engine,
            interrupts,
            interrupts_open: true,
            state: DispatchState::Waiting,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Runs until shutdown is requested.
    ///
    /// Returns the cause on a clean shutdown. A closed or failing
    /// transport, line overflow and interrupt source faults are errors.
    pub async fn run(&mut self) -> Result<ShutdownCause, DaemonError> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            self.state = DispatchState::Waiting;

            let wake = tokio::select! {
                biased;

                event = self.interrupts.recv(), if self.interrupts_open => match event {
                    Some(event) => Wake::Interrupt(event),
                    None => Wake::InterruptsClosed,
                },

                read = self.reader.read(&mut chunk) => {
                    Wake::Bytes(read.map_err(DaemonError::TransportRead)?)
                }
            };

            match wake {
                Wake::Interrupt(InterruptEvent::Triggered(source)) => {
                    info!(%source, "Forced shutdown");
                    self.engine.force_shutdown(source).await?;
                    self.state = DispatchState::ShuttingDown;
                    return Ok(ShutdownCause::Interrupt(source));
                }
                Wake::Interrupt(InterruptEvent::Failed { name, reason }) => {
                    return Err(DaemonError::Interrupt { name, reason });
                }
                Wake::InterruptsClosed => {
                    debug!("No interrupt sources remain");
                    self.interrupts_open = false;
                }
                Wake::Bytes(0) => return Err(DaemonError::TransportClosed),
                Wake::Bytes(n) => {
                    trace!(bytes = n, "Control bytes received");
                    if let Some(cause) = self.consume(&chunk[..n]).await? {
                        self.state = DispatchState::ShuttingDown;
                        return Ok(cause);
                    }
                }
            }
        }
    }

    /// Feeds bytes to the line buffer and applies completed lines.
    ///
    /// Bytes after a line that triggered shutdown are discarded.
    async fn consume(&mut self, bytes: &[u8]) -> Result<Option<ShutdownCause>, DaemonError> {
        self.state = DispatchState::Reading;

        for &byte in bytes {
            let Some(line) = self.lines.push(byte)? else {
                continue;
            };

            self.state = DispatchState::Dispatching;
            self.engine.apply(&line).await?;

            if self.engine.shutdown_requested() {
                return Ok(Some(ShutdownCause::OffCommand));
            }
            self.state = DispatchState::Reading;
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use thermo_core::{DeviceState, TemperatureUnit};
    use thermo_protocol::LineError;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    use crate::interrupt::{interrupt_channel, InterruptSource};
    use crate::outbox::Outbox;

    struct Harness {
        dispatcher: Dispatcher<DuplexStream>,
        control: DuplexStream,
        interrupts: mpsc::Sender<InterruptEvent>,
        state: Arc<DeviceState>,
        _observer: DuplexStream,
    }

    fn setup() -> Harness {
        let (reader, control) = tokio::io::duplex(4096);
        let (writer, observer) = tokio::io::duplex(4096);
        let state = Arc::new(DeviceState::default());
        let outbox = Arc::new(Outbox::new(Box::new(writer), None));
        let engine = CommandEngine::new(Arc::clone(&state), outbox);
        let (tx, rx) = interrupt_channel();

        Harness {
            dispatcher: Dispatcher::new(reader, engine, rx),
            control,
            interrupts: tx,
            state,
            _observer: observer,
        }
    }

    #[tokio::test]
    async fn test_off_ends_dispatch() {
        let mut h = setup();
        h.control.write_all(b"SCALE=C\nOFF\nSTOP\n").await.unwrap();

        let cause = h.dispatcher.run().await.unwrap();
        assert_eq!(cause, ShutdownCause::OffCommand);
        assert_eq!(h.dispatcher.state(), DispatchState::ShuttingDown);
        assert_eq!(h.state.unit(), TemperatureUnit::Celsius);
        assert!(!h.state.is_suppressed());
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let Harness {
            mut dispatcher,
            mut control,
            state,
            _observer,
            ..
        } = setup();

        let run = tokio::spawn(async move { dispatcher.run().await });
        control.write_all(b"ST").await.unwrap();
        tokio::task::yield_now().await;
        control.write_all(b"OP\nO").await.unwrap();
        tokio::task::yield_now().await;
        control.write_all(b"FF\n").await.unwrap();

        assert_eq!(run.await.unwrap().unwrap(), ShutdownCause::OffCommand);
        assert!(state.is_suppressed());
    }

    #[tokio::test]
    async fn test_interrupt_wins_over_pending_input() {
        let mut h = setup();
        h.interrupts
            .send(InterruptEvent::Triggered(InterruptSource::Button))
            .await
            .unwrap();
        h.control.write_all(b"SCALE=C\n").await.unwrap();

        let cause = h.dispatcher.run().await.unwrap();
        assert_eq!(cause, ShutdownCause::Interrupt(InterruptSource::Button));
        assert!(h.state.shutdown_requested());
        assert_eq!(h.state.unit(), TemperatureUnit::Fahrenheit);
    }

    #[tokio::test]
    async fn test_interrupt_failure_is_fatal() {
        let mut h = setup();
        h.interrupts
            .send(InterruptEvent::Failed {
                name: "button",
                reason: "POLLERR".to_string(),
            })
            .await
            .unwrap();

        let err = h.dispatcher.run().await.unwrap_err();
        assert!(matches!(err, DaemonError::Interrupt { name: "button", .. }));
    }

    #[tokio::test]
    async fn test_closed_transport_is_fatal() {
        let mut h = setup();
        h.control.write_all(b"STOP\n").await.unwrap();
        drop(h.control);

        let err = h.dispatcher.run().await.unwrap_err();
        assert!(matches!(err, DaemonError::TransportClosed));
        assert!(h.state.is_suppressed());
    }

    #[tokio::test]
    async fn test_no_interrupt_sources_still_reads() {
        let mut h = setup();
        drop(h.interrupts);
        h.control.write_all(b"OFF\n").await.unwrap();

        assert_eq!(h.dispatcher.run().await.unwrap(), ShutdownCause::OffCommand);
    }

    #[tokio::test]
    async fn test_overflow_is_fatal() {
        let mut h = setup();
        let long = vec![b'A'; 150];
        h.control.write_all(&long).await.unwrap();

        let err = h.dispatcher.run().await.unwrap_err();
        assert!(matches!(err, DaemonError::Line(LineError::Overflow { .. })));
    }
}

//! Shutdown interrupt sources.
//!
//! A shutdown interrupt forces termination independently of the control
//! protocol. Each source runs in its own small task and forwards exactly
//! one [`InterruptEvent`] to the dispatcher:
//!
//! - [`GpioButton`] - a push button on a sysfs GPIO line, rising edge
//! - [`SignalInterrupt`] - SIGTERM / SIGINT

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Channel capacity for interrupt events; each source sends at most one.
pub const INTERRUPT_BUFFER: usize = 4;

/// What triggered a forced shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSource {
    Button,
    Signal(&'static str),
}

impl fmt::Display for InterruptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptSource::Button => f.write_str("button"),
            InterruptSource::Signal(name) => f.write_str(name),
        }
    }
}

/// Outcome reported by an interrupt source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterruptEvent {
    Triggered(InterruptSource),
    /// The source's descriptor reported an error or hung up
    Failed { name: &'static str, reason: String },
}

/// Creates the channel the dispatcher listens on.
pub fn interrupt_channel() -> (mpsc::Sender<InterruptEvent>, mpsc::Receiver<InterruptEvent>) {
    mpsc::channel(INTERRUPT_BUFFER)
}

/// A one-shot trigger for forced shutdown.
#[async_trait]
pub trait ShutdownInterrupt: Send {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Resolves when the interrupt fires.
    async fn wait(&mut self) -> io::Result<InterruptSource>;
}

/// Spawns a task that waits on `source` and forwards its outcome.
pub fn spawn_interrupt(
    mut source: Box<dyn ShutdownInterrupt>,
    events: mpsc::Sender<InterruptEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = source.name();
        debug!(source = name, "Shutdown interrupt armed");

        let event = match source.wait().await {
            Ok(triggered) => {
                info!(source = %triggered, "Shutdown interrupt fired");
                InterruptEvent::Triggered(triggered)
            }
            Err(e) => {
                warn!(source = name, error = %e, "Shutdown interrupt failed");
                InterruptEvent::Failed {
                    name,
                    reason: e.to_string(),
                }
            }
        };

        if events.send(event).await.is_err() {
            debug!(source = name, "Dispatcher gone, dropping interrupt event");
        }
    })
}

// ============================================================================
// GPIO button
// ============================================================================

/// Push button on a sysfs GPIO line (`/sys/class/gpio/gpioN`).
///
/// The line is configured as an input with rising-edge notification; the
/// kernel then flags the `value` attribute with `POLLPRI` on each edge.
pub struct GpioButton {
    dir: PathBuf,
    value: AsyncFd<File>,
}

impl GpioButton {
    /// Configures and opens the GPIO line under `dir`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        fs::write(dir.join("direction"), "in")?;
        fs::write(dir.join("edge"), "rising")?;

        let mut file = File::open(dir.join("value"))?;
        // A fresh sysfs handle reports PRI until its first read.
        read_level(&mut file)?;

        let value = AsyncFd::with_interest(file, Interest::PRIORITY)?;
        debug!(gpio = %dir.display(), "GPIO button configured");

        Ok(Self { dir, value })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ShutdownInterrupt for GpioButton {
    fn name(&self) -> &'static str {
        "button"
    }

    async fn wait(&mut self) -> io::Result<InterruptSource> {
        let mut guard = self.value.ready_mut(Interest::PRIORITY).await?;
        let level = read_level(guard.get_inner_mut())?;
        guard.clear_ready();
        debug!(gpio = %self.dir.display(), level, "GPIO edge");
        Ok(InterruptSource::Button)
    }
}

/// Re-reads a sysfs GPIO `value` attribute from the start.
fn read_level(file: &mut File) -> io::Result<u8> {
    let mut buf = [0u8; 2];
    file.seek(SeekFrom::Start(0))?;
    let n = file.read(&mut buf)?;
    match buf.get(..n).and_then(|b| b.first()) {
        Some(b'0') => Ok(0),
        Some(b'1') => Ok(1),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unexpected GPIO value",
        )),
    }
}

// ============================================================================
// Signals
// ============================================================================

/// SIGTERM and SIGINT, handled like a button press.
pub struct SignalInterrupt {
    sigterm: Signal,
    sigint: Signal,
}

impl SignalInterrupt {
    /// Installs the handlers. Must be called from within a tokio runtime.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }
}

#[async_trait]
impl ShutdownInterrupt for SignalInterrupt {
    fn name(&self) -> &'static str {
        "signals"
    }

    async fn wait(&mut self) -> io::Result<InterruptSource> {
        let received = tokio::select! {
            r = self.sigterm.recv() => r.map(|_| "SIGTERM"),
            r = self.sigint.recv() => r.map(|_| "SIGINT"),
        };

        received
            .map(InterruptSource::Signal)
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "signal stream closed"))
    }
}

//! thermod - temperature sensor node daemon
//!
//! This crate provides the daemon core:
//! - `sampler` - periodic sensor reads and reading emission
//! - `engine` - control command validation and application
//! - `dispatcher` - control channel and shutdown interrupt multiplexing
//! - `outbox` - serialized writes to the observer and the audit log
//! - `transport` - console and TLS control channels
//! - `interrupt` - GPIO button and signal shutdown sources
//! - `config` - command line and config file resolution
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        thermod                            │
//! ├───────────────────────────────────────────────────────────┤
//! │                                                           │
//! │  ┌──────────────┐   DeviceState   ┌───────────────────┐   │
//! │  │   Sampler    │◀───(atomics)────│    Dispatcher     │   │
//! │  │  (task)      │                 │ CommandEngine     │   │
//! │  └──────┬───────┘                 └──┬─────────▲──────┘   │
//! │         │ readings        SHUTDOWN   │         │          │
//! │         ▼                            ▼         │          │
//! │  ┌──────────────────────────────────────┐  control lines  │
//! │  │  Outbox (transport + audit log)      │  interrupts     │
//! │  └──────────────────────────────────────┘                 │
//! │                                                           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Production code does not panic: fallible operations return `Result`
//! and channel closure is handled.

pub mod audit;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod outbox;
pub mod sampler;
pub mod transport;

pub use config::{Args, DaemonConfig, SensorConfig, TransportConfig};
pub use daemon::Daemon;
pub use engine::{CommandEngine, Disposition, ShutdownCause};
pub use error::{DaemonError, StartupError};

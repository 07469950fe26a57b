//! thermo-protocol - Line protocol for the thermod control channel
//!
//! One duplex, newline-terminated text channel carries both directions:
//!
//! - inbound control commands (`PERIOD=<n>`, `LOG...`, `STOP`, `SCALE=C`,
//!   `SCALE=F`, `START`, `OFF`), parsed by [`Command::parse`]
//! - outbound frames (readings, `SHUTDOWN`, the bootstrap `ID=<n>`),
//!   rendered by [`Outbound`]
//!
//! [`LineBuffer`] reassembles complete lines from arbitrary read chunks.

pub mod command;
pub mod line;
pub mod outbound;

pub use command::{Command, CommandError, DEGENERATE_LINE_LEN};
pub use line::{LineBuffer, LineError, LINE_CAPACITY};
pub use outbound::{DeviceId, Outbound};

//! thermod - temperature sensor node daemon
//!
//! Samples a thermistor periodically and reports readings to an observer,
//! which can steer the device with line-oriented commands.
//!
//! # Usage
//!
//! ```bash
//! # Console mode: readings on stdout, commands on stdin
//! thermod --scale C --period 2 --log /var/log/thermod.log
//!
//! # TLS mode with a shutdown button on GPIO 73
//! thermod --host observer.example.org --id 604 4000 --button /sys/class/gpio/gpio73
//!
//! # No hardware: report a constant 21.5 °C
//! thermod --simulate 21.5
//!
//! # Enable debug logging
//! RUST_LOG=thermod=debug thermod
//! ```
//!
//! # Exit status
//!
//! - 0: shutdown via `OFF`, the button or a signal
//! - 1: configuration or runtime fault
//! - 2: sensor or GPIO initialisation fault

use std::process::{self, ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use thermo_core::{FixedSensor, TemperatureSensor, Thermistor};
use thermo_protocol::DeviceId;
use thermod::audit::AuditLog;
use thermod::interrupt::{interrupt_channel, spawn_interrupt, GpioButton, SignalInterrupt};
use thermod::transport::Transport;
use thermod::{Args, Daemon, DaemonConfig, SensorConfig, StartupError, TransportConfig};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing() {
        eprintln!("thermod: failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "thermod exiting");
            let code = e
                .downcast_ref::<StartupError>()
                .map(StartupError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// Diagnostics go to stderr; stdout carries readings in console mode.
fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("thermod=info".parse()?)
                .add_directive("thermo_core=info".parse()?)
                .add_directive("thermo_protocol=info".parse()?),
        )
        .init();
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = DaemonConfig::resolve(args).map_err(StartupError::from)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run_daemon(config));

    // The console reader blocks in a worker thread and cannot be cancelled.
    runtime.shutdown_background();
    result
}

async fn run_daemon(config: DaemonConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "thermod starting"
    );

    let audit = match &config.log_path {
        Some(path) => Some(AuditLog::open(path).await.map_err(StartupError::from)?),
        None => None,
    };

    let sensor: Box<dyn TemperatureSensor> = match &config.sensor {
        SensorConfig::Thermistor { adc_path } => {
            let mut thermistor = Thermistor::new(adc_path);
            thermistor
                .read_celsius()
                .map_err(|e| StartupError::Hardware {
                    device: format!("thermistor at {}", adc_path.display()),
                    reason: e.to_string(),
                })?;
            Box::new(thermistor)
        }
        SensorConfig::Fixed { celsius } => {
            info!(celsius, "Using simulated sensor");
            Box::new(FixedSensor::new(*celsius))
        }
    };

    let (interrupt_tx, interrupt_rx) = interrupt_channel();

    let signals = SignalInterrupt::install().context("Failed to install signal handlers")?;
    spawn_interrupt(Box::new(signals), interrupt_tx.clone());

    if let Some(dir) = &config.button {
        let button = GpioButton::open(dir).map_err(|e| StartupError::Hardware {
            device: format!("button at {}", dir.display()),
            reason: e.to_string(),
        })?;
        spawn_interrupt(Box::new(button), interrupt_tx.clone());
    }
    drop(interrupt_tx);

    let (transport, identity) = match &config.transport {
        TransportConfig::Console => (Transport::console(), None),
        TransportConfig::Tls { host, port, id } => {
            let transport = Transport::connect_tls(host, *port)
                .await
                .map_err(StartupError::from)?;
            (transport, Some(DeviceId(*id)))
        }
    };

    let mut daemon = Daemon::new(
        config.settings,
        sensor,
        transport,
        audit,
        interrupt_rx,
    );
    if let Some(id) = identity {
        daemon = daemon.with_identity(id);
    }

    let cause = daemon.run().await?;
    info!(?cause, "thermod stopped");
    Ok(())
}

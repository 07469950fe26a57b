//! Periodic sensor sampling.
//!
//! The sampler is one of the daemon's two units of execution. Each cycle
//! it reads the unit and suppression flag, samples the sensor, publishes
//! the reading unless suppressed, then sleeps for the period read at that
//! moment. A period change arriving mid-sleep takes effect next cycle.
//!
//! The sleep races the cancellation token, so teardown does not wait out
//! a long period.

use std::sync::Arc;

use thermo_core::{DeviceState, Reading, TemperatureSensor, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DaemonError;
use crate::outbox::Outbox;

/// Spawns the sampler task.
///
/// The task ends when shutdown is requested or `cancel_token` fires, and
/// returns an error if the observer channel fails.
pub fn spawn_sampler(
    state: Arc<DeviceState>,
    sensor: Box<dyn TemperatureSensor>,
    outbox: Arc<Outbox>,
    cancel_token: CancellationToken,
) -> JoinHandle<Result<(), DaemonError>> {
    tokio::spawn(run_sampler(state, sensor, outbox, cancel_token))
}

async fn run_sampler(
    state: Arc<DeviceState>,
    mut sensor: Box<dyn TemperatureSensor>,
    outbox: Arc<Outbox>,
    cancel_token: CancellationToken,
) -> Result<(), DaemonError> {
    info!(
        period = %state.period(),
        unit = %state.unit(),
        "Sampler started"
    );

    loop {
        let unit = state.unit();
        let suppressed = state.is_suppressed();

        match sensor.read_celsius() {
            Ok(celsius) => {
                let reading = Reading::from_celsius(Timestamp::now(), celsius, unit);
                if !suppressed {
                    outbox
                        .publish_reading(&state, &reading)
                        .await
                        .map_err(DaemonError::TransportWrite)?;
                }
            }
            Err(e) => {
                warn!(error = %e, "Sensor read failed, skipping cycle");
            }
        }

        let period = state.period();
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                debug!("Sampler cancelled");
                break;
            }

            _ = sleep(period.as_duration()) => {}
        }

        if state.shutdown_requested() {
            break;
        }
    }

    info!("Sampler stopped");
    Ok(())
}

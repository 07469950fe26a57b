//! Daemon orchestration.
//!
//! Wires the sampler and the dispatcher around one shared
//! [`DeviceState`] and one [`Outbox`], runs them concurrently and tears
//! both down when either finishes.

use std::sync::Arc;

use thermo_core::{DeviceSettings, DeviceState, TemperatureSensor};
use thermo_protocol::{DeviceId, Outbound};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::dispatcher::Dispatcher;
use crate::engine::{CommandEngine, ShutdownCause};
use crate::error::DaemonError;
use crate::interrupt::InterruptEvent;
use crate::outbox::Outbox;
use crate::sampler::spawn_sampler;
use crate::transport::Transport;

/// A configured daemon, ready to run.
pub struct Daemon {
    settings: DeviceSettings,
    sensor: Box<dyn TemperatureSensor>,
    transport: Transport,
    audit: Option<AuditLog>,
    interrupts: mpsc::Receiver<InterruptEvent>,
    identity: Option<DeviceId>,
}

impl Daemon {
    pub fn new(
        settings: DeviceSettings,
        sensor: Box<dyn TemperatureSensor>,
        transport: Transport,
        audit: Option<AuditLog>,
        interrupts: mpsc::Receiver<InterruptEvent>,
    ) -> Self {
        Self {
            settings,
            sensor,
            transport,
            audit,
            interrupts,
            identity: None,
        }
    }

    /// Announces `id` to the observer before the first reading.
    pub fn with_identity(mut self, id: DeviceId) -> Self {
        self.identity = Some(id);
        self
    }

    /// Runs until shutdown or a fatal fault.
    ///
    /// On return the sampler has stopped and the transport has been
    /// flushed.
    pub async fn run(self) -> Result<ShutdownCause, DaemonError> {
        let Daemon {
            settings,
            sensor,
            transport,
            audit,
            interrupts,
            identity,
        } = self;

        info!(
            transport = %transport.kind(),
            period = %settings.period,
            unit = %settings.unit,
            audit = audit.is_some(),
            "Daemon starting"
        );

        let state = Arc::new(DeviceState::new(settings));
        let (reader, writer) = transport.into_split();
        let outbox = Arc::new(Outbox::new(writer, audit));

        if let Some(id) = identity {
            outbox
                .announce(&Outbound::identity(id))
                .await
                .map_err(DaemonError::TransportWrite)?;
            debug!(id = id.0, "Identity announced");
        }

        let cancel_token = CancellationToken::new();
        let mut sampler = spawn_sampler(
            Arc::clone(&state),
            sensor,
            Arc::clone(&outbox),
            cancel_token.clone(),
        );

        let engine = CommandEngine::new(Arc::clone(&state), Arc::clone(&outbox));
        let mut dispatcher = Dispatcher::new(reader, engine, interrupts);

        let dispatch = dispatcher.run();
        tokio::pin!(dispatch);

        let mut sampler_joined = false;
        let result = tokio::select! {
            biased;

            result = &mut dispatch => result,
            joined = &mut sampler => {
                sampler_joined = true;
                match flatten_join(joined) {
                    // The sampler saw shutdown first; the dispatcher has the cause.
                    Ok(()) if state.shutdown_requested() => dispatch.await,
                    Ok(()) => Err(DaemonError::SamplerStopped),
                    Err(e) => Err(e),
                }
            }
        };

        cancel_token.cancel();
        if !sampler_joined {
            if let Err(e) = flatten_join(sampler.await) {
                warn!(error = %e, "Sampler ended with error during teardown");
            }
        }

        if let Err(e) = outbox.flush().await {
            debug!(error = %e, "Final transport flush failed");
        }

        match &result {
            Ok(cause) => info!(?cause, "Daemon stopped"),
            Err(e) => warn!(error = %e, "Daemon stopped on fault"),
        }
        result
    }
}

fn flatten_join(
    joined: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    joined.map_err(|e| DaemonError::SamplerJoin(e.to_string()))?
}

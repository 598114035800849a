//! Agent composition root: wires config, transport, supervisor and controller.

use crate::config::Config;
use crate::controller::{ControllerSettings, RecordingController};
use crate::defaults;
use crate::error::{CamnodeError, Result};
use crate::identity::CameraIdentity;
use crate::process::{ProcessSupervisor, SystemProcessSupervisor};
use crate::stream::TransportEmitter;
use crate::transport::TransportClient;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the agent with real processes until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let supervisor = Arc::new(SystemProcessSupervisor::new(Duration::from_millis(
        config.capture.stop_grace_ms,
    )));
    run_until(config, supervisor, shutdown_signal()).await
}

/// Run the agent until `shutdown` resolves.
///
/// Dropping out of here stops the transport first; the controller then sees
/// its command channel close and exits, stopping any running process.
pub async fn run_until<F>(
    config: Config,
    supervisor: Arc<dyn ProcessSupervisor>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let work_dir = &config.storage.work_dir;
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| CamnodeError::Other(format!("work dir {}: {}", work_dir.display(), e)))?;

    let identity = CameraIdentity::from_config(config.camera.id.as_deref());
    tracing::info!(
        id = %identity,
        server = %format!("{}:{}", config.server.host, config.server.port),
        work_dir = %work_dir.display(),
        "camnode {} starting",
        crate::version_string()
    );

    let (commands_tx, commands_rx) = mpsc::channel(defaults::EVENT_QUEUE_DEPTH);
    let (transport, outbound) = TransportClient::new(
        config.server.clone(),
        identity.clone(),
        commands_tx,
        defaults::OUTBOUND_QUEUE_DEPTH,
    );
    let controller = RecordingController::new(
        identity,
        ControllerSettings::from(&config),
        supervisor,
        Arc::new(TransportEmitter::new(outbound)),
    );

    let transport_task = tokio::spawn(transport.run());
    let mut controller_task = tokio::spawn(controller.run(commands_rx));

    tokio::select! {
        _ = shutdown => tracing::info!("shutting down"),
        res = &mut controller_task => {
            return match res {
                Ok(()) => Err(CamnodeError::Other("controller stopped unexpectedly".to_string())),
                Err(e) => Err(CamnodeError::Other(format!("controller task failed: {}", e))),
            };
        }
    }

    transport_task.abort();
    if let Err(e) = transport_task.await
        && !e.is_cancelled()
    {
        tracing::error!("transport task failed: {}", e);
    }
    if let Err(e) = controller_task.await {
        tracing::error!("controller task failed: {}", e);
    }

    tracing::info!("stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
        res = wait_for_sigterm() => match res {
            Ok(()) => tracing::info!("received SIGTERM"),
            Err(e) => {
                tracing::error!("{}", e);
                std::future::pending::<()>().await;
            }
        },
    }
}

/// Wait for SIGTERM (sent by service managers).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| CamnodeError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    std::future::pending::<()>().await
}

use duckplay::backend::{load_services, AudioBackend};
use duckplay::bus::{WebSocketBus, VOLUME_QUERY_TIMEOUT};
use duckplay::cli::{init_tracing, Cli};
use duckplay::config::Settings;
use duckplay::engine::RodioEngine;
use duckplay::init_app_dirs;
use duckplay::service::{AudioService, ServiceCommand};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const LOG_TARGET: &str = "duckplay::main";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::new();
    let args = &cli.args;
    init_tracing(args.json_logs);

    init_app_dirs()?;

    // Config file first, then CLI/env overrides
    let config_path = args.config_path();
    let mut settings = Settings::load(&config_path)?;
    args.apply_to(&mut settings);
    settings.validate()?;

    if args.save_config {
        settings.save(&config_path)?;
        info!(target: LOG_TARGET, "Configuration written to {}", config_path.display());
        return Ok(());
    }

    let bus = Arc::new(WebSocketBus::connect(&settings.bus.url()).await?);

    let services = load_services(&settings.audio, &*bus, VOLUME_QUERY_TIMEOUT, |name, _config| {
        info!(target: LOG_TARGET, "Opening audio output for backend '{}'", name);
        RodioEngine::start()
    })
    .await;
    if services.is_empty() {
        warn!(target: LOG_TARGET, "No active backends configured; only bus queries will be answered.");
    }
    let backends: Vec<Arc<dyn AudioBackend>> = services
        .into_iter()
        .map(|service| service as Arc<dyn AudioBackend>)
        .collect();

    let (service, command_tx) = AudioService::new(bus.clone(), backends, settings.audio.default_backend.clone());
    let mut service_task = tokio::spawn(service.run());
    let mut service_done = false;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(target: LOG_TARGET, "Failed to listen for Ctrl-C: {}", e);
            }
            info!(target: LOG_TARGET, "Shutting down.");
        }
        _ = bus.closed() => {
            warn!(target: LOG_TARGET, "Message bus connection lost, shutting down.");
        }
        result = &mut service_task => {
            service_done = true;
            if let Err(e) = result {
                error!(target: LOG_TARGET, "Audio service task failed: {}", e);
            }
        }
    }

    if !service_done {
        let _ = command_tx.send(ServiceCommand::Shutdown).await;
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, service_task).await {
            Ok(Ok(())) => info!(target: LOG_TARGET, "Audio service stopped."),
            Ok(Err(e)) => error!(target: LOG_TARGET, "Audio service task failed: {}", e),
            Err(_) => warn!(target: LOG_TARGET, "Audio service did not stop in time."),
        }
    }

    bus.close().await;
    Ok(())
}

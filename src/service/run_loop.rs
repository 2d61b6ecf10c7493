// src/service/run_loop.rs
use super::{command_handler, message_to_command, AudioService, ServiceCommand, LOG_TARGET};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, trace, warn};

/// Runs the audio service's message processing loop.
pub(super) async fn run_service_loop(service: &mut AudioService) {
    info!(target: LOG_TARGET, "Audio service run loop started.");
    let mut commands_open = true;

    loop {
        tokio::select! {
            biased;

            // --- Injected commands ---
            maybe_command = service.command_rx.recv(), if commands_open => match maybe_command {
                Some(ServiceCommand::Shutdown) => {
                    info!(target: LOG_TARGET, "Shutdown command received. Exiting run loop.");
                    break;
                }
                Some(command) => {
                    trace!(target: LOG_TARGET, "Received command: {:?}", command);
                    command_handler::dispatch(service, command).await;
                }
                None => {
                    trace!(target: LOG_TARGET, "Command channel closed, serving the bus only.");
                    commands_open = false;
                }
            },

            // --- Backend track changes ---
            Some(event) = service.track_rx.recv() => {
                command_handler::handle_track_event(service, event).await;
            }

            // --- Bus messages ---
            received = service.bus_rx.recv() => match received {
                Ok(message) => {
                    if let Some(command) = message_to_command(&message) {
                        trace!(target: LOG_TARGET, "[Bus Incoming] {} -> {:?}", message.msg_type, command);
                        command_handler::dispatch(service, command).await;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(target: LOG_TARGET, "Audio service lagged behind the bus, {} messages dropped.", n);
                }
                Err(RecvError::Closed) => {
                    info!(target: LOG_TARGET, "Message bus closed. Exiting run loop.");
                    break;
                }
            },
        }
    }

    info!(target: LOG_TARGET, "Audio service run loop finished. Shutting down backends.");
    command_handler::shutdown_backends(&service.backends);
    service.current = None;
    info!(target: LOG_TARGET, "Audio service cleanup complete.");
}

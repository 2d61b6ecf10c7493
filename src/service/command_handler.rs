use super::{
    AudioService, ServiceCommand, ServiceError, TrackEvent, LOG_TARGET, PLAYING_TRACK, QUEUE_END, STOP_HANDLED,
    TRACK_INFO_REPLY,
};
use crate::backend::{AudioBackend, TrackEntry};
use crate::bus::Message;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Executes one command, logging failures.
pub(super) async fn dispatch(service: &mut AudioService, command: ServiceCommand) {
    let result = match command {
        ServiceCommand::Play { tracks, repeat } => handle_play(service, tracks, repeat),
        ServiceCommand::Queue { tracks } => handle_queue(service, tracks),
        ServiceCommand::Stop => handle_stop(service).await,
        ServiceCommand::Pause => with_current(service, "pause", |b| b.pause()),
        ServiceCommand::Resume => with_current(service, "resume", |b| b.resume()),
        ServiceCommand::Next => with_current(service, "next", |b| b.next()),
        ServiceCommand::Previous => with_current(service, "previous", |b| b.previous()),
        ServiceCommand::SeekForward { seconds } => with_current(service, "seek_forward", |b| b.seek_forward(seconds)),
        ServiceCommand::SeekBackward { seconds } => {
            with_current(service, "seek_backward", |b| b.seek_backward(seconds))
        }
        ServiceCommand::Duck => with_current(service, "duck", |b| b.duck_volume()),
        ServiceCommand::Restore => with_current(service, "restore", |b| b.restore_volume()),
        ServiceCommand::TrackInfo { request } => {
            handle_track_info(service, &request).await;
            Ok(())
        }
        ServiceCommand::ListBackends { request } => {
            handle_list_backends(service, &request).await;
            Ok(())
        }
        // Handled by the run loop.
        ServiceCommand::Shutdown => Ok(()),
    };

    if let Err(e) = result {
        error!(target: LOG_TARGET, "Audio service command failed: {}", e);
    }
}

fn with_current<F>(service: &AudioService, action: &str, op: F) -> Result<(), ServiceError>
where
    F: FnOnce(&dyn AudioBackend) -> Result<(), crate::engine::EngineError>,
{
    match &service.current {
        Some(backend) => {
            debug!(target: LOG_TARGET, backend = backend.name(), "{}", action);
            op(&**backend)?;
        }
        None => debug!(target: LOG_TARGET, "No active backend for {}", action),
    }
    Ok(())
}

/// Stops whatever plays, then clears, fills and starts the selected backend.
#[instrument(skip(service, tracks), fields(count = tracks.len()))]
pub(super) fn handle_play(service: &mut AudioService, tracks: Vec<TrackEntry>, repeat: bool) -> Result<(), ServiceError> {
    if tracks.is_empty() {
        warn!(target: LOG_TARGET, "Play request without tracks");
        return Ok(());
    }

    if let Some(current) = &service.current {
        current.stop()?;
    }

    let backend = service.select_backend(&tracks).ok_or_else(|| {
        ServiceError::NoBackend(format!("no backend supports {:?}", tracks[0].uri().unwrap_or_default()))
    })?;
    info!(target: LOG_TARGET, "Playing {} tracks on '{}'", tracks.len(), backend.name());

    backend.clear_queue()?;
    backend.enqueue(&tracks)?;
    backend.play(repeat)?;
    service.current = Some(backend);
    Ok(())
}

/// Appends to the current backend's queue, or starts playback when nothing
/// was played yet.
#[instrument(skip(service, tracks), fields(count = tracks.len()))]
pub(super) fn handle_queue(service: &mut AudioService, tracks: Vec<TrackEntry>) -> Result<(), ServiceError> {
    match service.current.clone() {
        Some(backend) => {
            info!(target: LOG_TARGET, "Queueing {} tracks on '{}'", tracks.len(), backend.name());
            backend.enqueue(&tracks)?;
            Ok(())
        }
        None => {
            debug!(target: LOG_TARGET, "Nothing playing, starting queued tracks");
            handle_play(service, tracks, false)
        }
    }
}

async fn handle_stop(service: &mut AudioService) -> Result<(), ServiceError> {
    let Some(backend) = service.current.clone() else {
        return Ok(());
    };
    if backend.stop()? {
        info!(target: LOG_TARGET, "Stopped '{}'", backend.name());
        let by = format!("audio:{}", backend.name());
        service.emit(Message::with_data(STOP_HANDLED, json!({ "by": by }))).await;
    }
    Ok(())
}

/// Replies with the current track, or an empty object when nothing plays.
pub(super) async fn handle_track_info(service: &AudioService, request: &Message) {
    let data = match &service.current {
        Some(backend) => serde_json::to_value(backend.track_info()).unwrap_or_else(|e| {
            warn!(target: LOG_TARGET, "Failed to serialize track info: {}", e);
            json!({})
        }),
        None => json!({}),
    };
    service.emit(request.reply(TRACK_INFO_REPLY, data)).await;
}

/// Replies with every backend's supported schemes and whether it is the default.
pub(super) async fn handle_list_backends(service: &AudioService, request: &Message) {
    let mut data = Map::new();
    for backend in &service.backends {
        let is_default = service.default_backend.as_deref() == Some(backend.name());
        data.insert(
            backend.name().to_string(),
            json!({
                "supported_uris": backend.supported_schemes(),
                "default": is_default,
                "remote": false,
            }),
        );
    }
    service
        .emit(request.reply(request.response_type(), Value::Object(data)))
        .await;
}

/// Publishes a backend's track change.
pub(super) async fn handle_track_event(service: &AudioService, event: TrackEvent) {
    let message = match event.track {
        Some(track) => {
            info!(target: LOG_TARGET, backend = %event.backend, "Playing track: {}", track);
            Message::with_data(PLAYING_TRACK, json!({ "track": track }))
        }
        None => {
            debug!(target: LOG_TARGET, backend = %event.backend, "Queue ended");
            Message::new(QUEUE_END)
        }
    };
    service.emit(message).await;
}

/// Stops and releases every backend.
pub(super) fn shutdown_backends(backends: &[Arc<dyn AudioBackend>]) {
    for backend in backends {
        if let Err(e) = backend.stop() {
            warn!(target: LOG_TARGET, "Failed to stop '{}': {}", backend.name(), e);
        }
        backend.shutdown();
    }
}

use super::{spawn_event_relay, AudioBackend, PlaybackAdapter, VolumeDucker, LOG_TARGET};
use crate::bus::{query_system_volume, MessageBus, DEFAULT_SYSTEM_VOLUME};
use crate::config::{AudioSettings, BackendConfig};
use crate::engine::{EngineError, MediaEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Backend type handled here.
pub const BACKEND_TYPE: &str = "vlc";
/// Also accepted, naming the engine actually used.
pub const BACKEND_TYPE_ALIAS: &str = "rodio";

pub fn is_supported_type(backend_type: &str) -> bool {
    backend_type == BACKEND_TYPE || backend_type == BACKEND_TYPE_ALIAS
}

/// Creates one adapter per active backend entry of a supported type, in name
/// order.
///
/// The start volume is the configured `volume`, else the host's system
/// volume (asked once per backend, bounded by `volume_timeout`), else
/// [`DEFAULT_SYSTEM_VOLUME`]. `factory` builds the engine; a backend whose
/// engine fails to start is skipped. Each adapter's event relay is running
/// when this returns, so it must be called inside a tokio runtime.
#[instrument(skip_all, fields(configured = audio.backends.len()))]
pub async fn load_services<E, F>(
    audio: &AudioSettings,
    bus: &dyn MessageBus,
    volume_timeout: Duration,
    mut factory: F,
) -> Vec<Arc<PlaybackAdapter<E>>>
where
    E: MediaEngine,
    F: FnMut(&str, &BackendConfig) -> Result<E, EngineError>,
{
    let mut services = Vec::new();

    for (name, config) in &audio.backends {
        if !is_supported_type(&config.backend_type) || !config.active {
            debug!(target: LOG_TARGET, "Ignoring backend '{}' (type {}, active {})", name, config.backend_type, config.active);
            continue;
        }

        let volume = match config.volume {
            Some(volume) => volume,
            None => query_system_volume(bus, volume_timeout)
                .await
                .unwrap_or(DEFAULT_SYSTEM_VOLUME),
        };

        let engine = match factory(name, config) {
            Ok(engine) => engine,
            Err(e) => {
                error!(target: LOG_TARGET, "Failed to start engine for backend '{}': {}", name, e);
                continue;
            }
        };

        let adapter = Arc::new(PlaybackAdapter::new(
            name.as_str(),
            Arc::new(engine),
            volume,
            VolumeDucker::new(config.duck, config.low_volume),
        ));
        spawn_event_relay(&adapter);
        info!(target: LOG_TARGET, "Loaded backend '{}' (volume {}, duck {})", adapter.name(), volume, config.duck);
        services.push(adapter);
    }

    services
}

//! Bus-driven audio service routing playback requests to the backends

mod command_handler;
mod error;
pub mod incoming_handler;
mod run_loop;
mod state;

pub use error::ServiceError;
pub use incoming_handler::message_to_command;
pub use state::{ServiceCommand, TrackEvent};

use crate::backend::{AudioBackend, TrackEntry};
use crate::bus::{Message, MessageBus};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, instrument, trace};

pub const LOG_TARGET: &str = "duckplay::service";

pub const PLAYING_TRACK: &str = "mycroft.audio.playing_track";
pub const QUEUE_END: &str = "mycroft.audio.queue_end";
pub const TRACK_INFO_REPLY: &str = "mycroft.audio.service.track_info_reply";
pub const STOP_HANDLED: &str = "mycroft.stop.handled";

const COMMAND_BUFFER_SIZE: usize = 32;

/// Owns the loaded backends and serves playback requests from the bus.
///
/// Run it with [`AudioService::run`] on its own task; the returned command
/// sender can inject commands (e.g. [`ServiceCommand::Shutdown`]).
pub struct AudioService {
    bus: Arc<dyn MessageBus>,
    backends: Vec<Arc<dyn AudioBackend>>,
    default_backend: Option<String>,
    /// Backend that received the last play request.
    current: Option<Arc<dyn AudioBackend>>,
    bus_rx: broadcast::Receiver<Message>,
    command_rx: mpsc::Receiver<ServiceCommand>,
    track_rx: mpsc::UnboundedReceiver<TrackEvent>,
}

impl AudioService {
    /// Subscribes to the bus and hooks every backend's track callback into
    /// the service.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        backends: Vec<Arc<dyn AudioBackend>>,
        default_backend: Option<String>,
    ) -> (Self, mpsc::Sender<ServiceCommand>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (track_tx, track_rx) = mpsc::unbounded_channel();

        for backend in &backends {
            let tx = track_tx.clone();
            let name = backend.name().to_string();
            backend.set_track_callback(Arc::new(move |track| {
                let event = TrackEvent {
                    backend: name.clone(),
                    track,
                };
                if tx.send(event).is_err() {
                    trace!(target: LOG_TARGET, "Audio service gone, dropping track event");
                }
            }));
        }

        let service = AudioService {
            bus_rx: bus.subscribe(),
            bus,
            backends,
            default_backend,
            current: None,
            command_rx,
            track_rx,
        };
        (service, command_tx)
    }

    pub fn backends(&self) -> &[Arc<dyn AudioBackend>] {
        &self.backends
    }

    pub fn current_backend(&self) -> Option<&str> {
        self.current.as_ref().map(|b| b.name())
    }

    /// Picks the backend for `tracks`: the default backend when it supports
    /// the first track's scheme, else the first backend that does.
    pub fn select_backend(&self, tracks: &[TrackEntry]) -> Option<Arc<dyn AudioBackend>> {
        let scheme = tracks.first().and_then(TrackEntry::scheme);
        let supports = |backend: &Arc<dyn AudioBackend>| match &scheme {
            Some(scheme) => backend.supports_scheme(scheme),
            None => true,
        };

        let preferred = self
            .default_backend
            .as_deref()
            .and_then(|name| self.backends.iter().find(|b| b.name() == name))
            .filter(|b| supports(*b));
        if let Some(backend) = preferred {
            return Some(backend.clone());
        }
        debug!(target: LOG_TARGET, "Default backend unavailable for scheme {:?}", scheme);
        self.backends.iter().find(|b| supports(*b)).cloned()
    }

    /// Publishes a message, logging failures.
    async fn emit(&self, message: Message) {
        let msg_type = message.msg_type.clone();
        if let Err(e) = self.bus.emit(message).await {
            error!(target: LOG_TARGET, "Failed to emit {}: {}", msg_type, e);
        }
    }

    /// Runs the service until shutdown or until the bus closes, then stops
    /// and shuts down every backend.
    #[instrument(skip(self), fields(backends = self.backends.len()))]
    pub async fn run(mut self) {
        run_loop::run_service_loop(&mut self).await;
    }
}

use super::{AudioBackend, PlaybackAdapter, LOG_TARGET};
use crate::engine::{EngineEvent, MediaEngine};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Forwards engine events to the adapter's track callback.
///
/// Holds the adapter weakly; the relay ends once the adapter is dropped or
/// the engine's event channel closes.
pub struct EventRelay<E: MediaEngine> {
    adapter: Weak<PlaybackAdapter<E>>,
}

impl<E: MediaEngine> EventRelay<E> {
    pub fn new(adapter: &Arc<PlaybackAdapter<E>>) -> Self {
        EventRelay {
            adapter: Arc::downgrade(adapter),
        }
    }

    /// Handles one event. Returns `false` when the adapter is gone.
    pub fn dispatch(&self, event: EngineEvent) -> bool {
        let Some(adapter) = self.adapter.upgrade() else {
            return false;
        };
        let Some(callback) = adapter.callback() else {
            trace!(target: LOG_TARGET, backend = adapter.name(), "No track callback for {:?}", event);
            return true;
        };

        match event {
            EngineEvent::TrackStarted => {
                let name = adapter.track_info().name;
                debug!(target: LOG_TARGET, backend = adapter.name(), "Track started: {:?}", name);
                callback(name);
            }
            EngineEvent::QueueEnded => {
                debug!(target: LOG_TARGET, backend = adapter.name(), "Queue ended");
                callback(None);
            }
        }
        true
    }

    pub async fn run(self, mut events: broadcast::Receiver<EngineEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if !self.dispatch(event) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(target: LOG_TARGET, "Event relay lagged, {} engine events dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!(target: LOG_TARGET, "Event relay finished");
    }
}

/// Subscribes to the adapter's engine and relays its events on a tokio task.
/// The task is owned by the adapter and ends with its shutdown.
pub fn spawn_event_relay<E: MediaEngine>(adapter: &Arc<PlaybackAdapter<E>>) {
    let events = adapter.engine().subscribe_events();
    let relay = EventRelay::new(adapter);
    let handle = tokio::spawn(relay.run(events));
    adapter.attach_relay(handle);
}

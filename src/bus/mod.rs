//! Message bus client used to talk to the voice assistant host

mod error;
pub mod message;
mod volume;
pub mod websocket;

pub use error::BusError;
pub use message::Message;
pub use volume::{query_system_volume, DEFAULT_SYSTEM_VOLUME, VOLUME_QUERY_TIMEOUT};
pub use websocket::WebSocketBus;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

pub const LOG_TARGET: &str = "duckplay::bus";

/// Default timeout for request/response exchanges on the bus.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Publish/subscribe access to the host message bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a message to every bus client.
    async fn emit(&self, message: Message) -> Result<(), BusError>;

    /// Subscribes to every message seen on the bus from now on.
    fn subscribe(&self) -> broadcast::Receiver<Message>;

    /// Emits `message` and waits for the first message of `reply_type`
    /// (`<type>.response` when `None`). Returns `None` on timeout, send
    /// failure or when the bus closes.
    async fn wait_for_response(
        &self,
        message: Message,
        reply_type: Option<&str>,
        timeout: Duration,
    ) -> Option<Message> {
        let reply_type = reply_type
            .map(str::to_string)
            .unwrap_or_else(|| message.response_type());
        // Subscribe before emitting so a fast reply is not missed.
        let mut rx = self.subscribe();

        if let Err(e) = self.emit(message).await {
            warn!(target: LOG_TARGET, "Failed to emit request awaiting {}: {}", reply_type, e);
            return None;
        }

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(msg) if msg.msg_type == reply_type => return Some(msg),
                    Ok(msg) => trace!(target: LOG_TARGET, "Skipping {} while waiting for {}", msg.msg_type, reply_type),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(target: LOG_TARGET, "Lagged {} messages while waiting for {}", n, reply_type);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(reply) => reply,
            Err(_) => {
                debug!(target: LOG_TARGET, "No {} within {:?}", reply_type, timeout);
                None
            }
        }
    }
}

use super::{Message, MessageBus, LOG_TARGET};
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Volume used when the host does not answer the volume query.
pub const DEFAULT_SYSTEM_VOLUME: u8 = 50;

/// Upper bound for the startup volume query.
pub const VOLUME_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Asks the host for the system volume (`mycroft.volume.get`).
///
/// The reply carries `percent` as a 0.0-1.0 fraction. Returns `None` when no
/// usable reply arrives within `timeout`.
#[instrument(skip(bus))]
pub async fn query_system_volume(bus: &dyn MessageBus, timeout: Duration) -> Option<u8> {
    let request = Message::with_data("mycroft.volume.get", json!({ "show": false }));
    let reply = bus.wait_for_response(request, None, timeout).await?;

    match reply.get("percent").and_then(|v| v.as_f64()) {
        Some(percent) => {
            let volume = (percent * 100.0).clamp(0.0, 100.0) as u8;
            info!(target: LOG_TARGET, "Host reported system volume {}%", volume);
            Some(volume)
        }
        None => {
            warn!(target: LOG_TARGET, "Volume reply without a numeric percent: {:?}", reply.data);
            None
        }
    }
}

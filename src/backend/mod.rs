//! Pluggable audio backends driven by the audio service

mod adapter;
mod ducking;
mod registry;
mod relay;

pub use adapter::{PlaybackAdapter, SUPPORTED_SCHEMES};
pub use ducking::{DuckAction, RestoreAction, VolumeDucker, DEFAULT_LOW_VOLUME};
pub use registry::{is_supported_type, load_services, BACKEND_TYPE, BACKEND_TYPE_ALIAS};
pub use relay::{spawn_event_relay, EventRelay};

use crate::engine::EngineError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const LOG_TARGET: &str = "duckplay::backend";

/// Host callback invoked with the name of a newly started track, or `None`
/// once the queue ended.
pub type TrackCallback = Arc<dyn Fn(Option<String>) + Send + Sync>;

/// A track as sent by the host: a bare URI, or a list whose first element is
/// the URI (followed by extras such as a mime type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackEntry {
    Uri(String),
    Wrapped(Vec<String>),
}

impl TrackEntry {
    /// The playable URI, `None` for an empty wrapper.
    pub fn uri(&self) -> Option<&str> {
        match self {
            TrackEntry::Uri(uri) => Some(uri),
            TrackEntry::Wrapped(parts) => parts.first().map(String::as_str),
        }
    }

    /// Scheme of the URI (`file` for bare paths).
    pub fn scheme(&self) -> Option<String> {
        let uri = self.uri()?;
        match url::Url::parse(uri) {
            Ok(url) if url.scheme().len() > 1 => Some(url.scheme().to_string()),
            _ => Some("file".to_string()),
        }
    }
}

impl From<&str> for TrackEntry {
    fn from(uri: &str) -> Self {
        TrackEntry::Uri(uri.to_string())
    }
}

/// Information about the current track as reported to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub album: Option<String>,
    /// Always holds exactly one entry.
    pub artists: Vec<Option<String>>,
    pub name: Option<String>,
}

impl TrackInfo {
    pub fn new(album: Option<String>, artist: Option<String>, name: Option<String>) -> Self {
        TrackInfo {
            album,
            artists: vec![artist],
            name,
        }
    }

    /// Nothing loaded.
    pub fn empty() -> Self {
        TrackInfo::new(None, None, None)
    }
}

/// Playback operations the audio service drives on a backend.
pub trait AudioBackend: Send + Sync {
    fn name(&self) -> &str;
    fn supported_schemes(&self) -> &'static [&'static str];
    fn clear_queue(&self) -> Result<(), EngineError>;
    fn enqueue(&self, tracks: &[TrackEntry]) -> Result<(), EngineError>;
    fn play(&self, repeat: bool) -> Result<(), EngineError>;
    /// Returns `false` when nothing was playing.
    fn stop(&self) -> Result<bool, EngineError>;
    fn pause(&self) -> Result<(), EngineError>;
    fn resume(&self) -> Result<(), EngineError>;
    fn next(&self) -> Result<(), EngineError>;
    fn previous(&self) -> Result<(), EngineError>;
    fn duck_volume(&self) -> Result<(), EngineError>;
    fn restore_volume(&self) -> Result<(), EngineError>;
    fn track_info(&self) -> TrackInfo;
    fn seek_forward(&self, seconds: i64) -> Result<(), EngineError>;
    fn seek_backward(&self, seconds: i64) -> Result<(), EngineError>;
    fn set_track_callback(&self, callback: TrackCallback);
    fn shutdown(&self);

    fn supports_scheme(&self, scheme: &str) -> bool {
        self.supported_schemes().iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

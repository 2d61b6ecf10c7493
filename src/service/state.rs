use crate::backend::TrackEntry;
use crate::bus::Message;

/// Commands processed by the audio service task.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCommand {
    Play { tracks: Vec<TrackEntry>, repeat: bool },
    Queue { tracks: Vec<TrackEntry> },
    Stop,
    Pause,
    Resume,
    Next,
    Previous,
    SeekForward { seconds: i64 },
    SeekBackward { seconds: i64 },
    /// Answered with `mycroft.audio.service.track_info_reply`.
    TrackInfo { request: Message },
    /// Answered with `<type>.response`.
    ListBackends { request: Message },
    /// The assistant started listening or speaking.
    Duck,
    /// The assistant stopped listening or speaking.
    Restore,
    Shutdown,
}

/// A track change reported by a backend's callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub backend: String,
    /// `None` once the backend's queue ended.
    pub track: Option<String>,
}

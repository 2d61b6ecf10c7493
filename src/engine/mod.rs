//! Media engine abstraction and the rodio-backed engine implementation

mod error;
mod metadata;
mod rodio_engine;
mod source;

pub use error::EngineError;
pub use metadata::{probe_metadata, TrackMetadata};
pub use rodio_engine::RodioEngine;
pub use source::{MediaSource, SourceLoader};

use tokio::sync::broadcast;

pub const LOG_TARGET: &str = "duckplay::engine";

/// Capacity of the engine event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Events delivered by the engine from its own thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A list item was loaded and started playing. Resuming from pause does
    /// not send it again.
    TrackStarted,
    /// The list player reached the end of the list.
    QueueEnded,
}

/// How the list player behaves after the last item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Default,
    Loop,
}

/// Operations the playback adapter needs from a media engine.
///
/// Calls are synchronous and expected not to block on playback. Times are in
/// milliseconds, volume is a 0-100 percentage.
pub trait MediaEngine: Send + Sync + 'static {
    /// Discards the current list and installs an empty one.
    fn clear_list(&self) -> Result<(), EngineError>;
    fn add_media(&self, uri: &str) -> Result<(), EngineError>;
    fn set_playback_mode(&self, mode: PlaybackMode) -> Result<(), EngineError>;
    /// Starts list playback. Load failures surface asynchronously.
    fn play(&self) -> Result<(), EngineError>;
    fn stop(&self) -> Result<(), EngineError>;
    fn next(&self) -> Result<(), EngineError>;
    fn previous(&self) -> Result<(), EngineError>;
    fn set_pause(&self, paused: bool) -> Result<(), EngineError>;
    fn is_playing(&self) -> bool;
    fn volume(&self) -> u8;
    fn set_volume(&self, volume: u8) -> Result<(), EngineError>;
    fn time_ms(&self) -> i64;
    /// Length of the current item, `None` when unknown.
    fn length_ms(&self) -> Option<i64>;
    fn set_time_ms(&self, position_ms: i64) -> Result<(), EngineError>;
    /// Metadata of the currently loaded item.
    fn metadata(&self) -> Option<TrackMetadata>;
    fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent>;
    /// Releases the output device. The engine is unusable afterwards.
    fn shutdown(&self) {}
}

// src/backend/adapter.rs
use super::{
    ducking::{DuckAction, RestoreAction, VolumeDucker},
    AudioBackend, TrackCallback, TrackEntry, TrackInfo, LOG_TARGET,
};
use crate::engine::{EngineError, MediaEngine, PlaybackMode};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// URI schemes the engine can open.
pub const SUPPORTED_SCHEMES: &[&str] = &["file", "http", "https"];

#[derive(Debug)]
struct AdapterState {
    /// Volume applied whenever playback starts.
    volume: u8,
    ducker: VolumeDucker,
}

/// Audio backend that forwards playlist control to a [`MediaEngine`] and adds
/// volume ducking and track-change notification on top.
pub struct PlaybackAdapter<E: MediaEngine> {
    name: String,
    engine: Arc<E>,
    state: Mutex<AdapterState>,
    callback: Mutex<Option<TrackCallback>>,
    relay: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clamps a seek target to `[0, length]`; the upper bound only applies when
/// the length is known.
pub(crate) fn clamp_seek(target_ms: i64, length_ms: Option<i64>) -> i64 {
    let target = match length_ms {
        Some(length) if length >= 0 && target_ms > length => length,
        _ => target_ms,
    };
    target.max(0)
}

impl<E: MediaEngine> PlaybackAdapter<E> {
    pub fn new(name: impl Into<String>, engine: Arc<E>, volume: u8, ducker: VolumeDucker) -> Self {
        PlaybackAdapter {
            name: name.into(),
            engine,
            state: Mutex::new(AdapterState {
                volume: volume.min(100),
                ducker,
            }),
            callback: Mutex::new(None),
            relay: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Volume applied when playback starts.
    pub fn volume(&self) -> u8 {
        lock(&self.state).volume
    }

    pub fn is_ducked(&self) -> bool {
        lock(&self.state).ducker.is_ducked()
    }

    pub fn ducker(&self) -> VolumeDucker {
        lock(&self.state).ducker.clone()
    }

    /// Copy of the registered callback. The slot lock is released on return.
    pub(crate) fn callback(&self) -> Option<TrackCallback> {
        lock(&self.callback).clone()
    }

    /// Keeps the event relay task so that shutdown can end it.
    pub(crate) fn attach_relay(&self, handle: JoinHandle<()>) {
        if let Some(previous) = lock(&self.relay).replace(handle) {
            previous.abort();
        }
    }

    fn seek_by(&self, delta_ms: i64) -> Result<(), EngineError> {
        let current = self.engine.time_ms();
        let target = clamp_seek(current.saturating_add(delta_ms), self.engine.length_ms());
        trace!(target: LOG_TARGET, backend = %self.name, "Seeking from {}ms to {}ms", current, target);
        self.engine.set_time_ms(target)
    }
}

impl<E: MediaEngine> AudioBackend for PlaybackAdapter<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_schemes(&self) -> &'static [&'static str] {
        SUPPORTED_SCHEMES
    }

    fn clear_queue(&self) -> Result<(), EngineError> {
        debug!(target: LOG_TARGET, backend = %self.name, "Clearing queue");
        self.engine.clear_list()
    }

    #[instrument(skip(self, tracks), fields(backend = %self.name, count = tracks.len()))]
    fn enqueue(&self, tracks: &[TrackEntry]) -> Result<(), EngineError> {
        debug!(target: LOG_TARGET, "Track list is {:?}", tracks);
        for track in tracks {
            match track.uri() {
                Some(uri) => self.engine.add_media(uri)?,
                None => warn!(target: LOG_TARGET, "Skipping empty track entry"),
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    fn play(&self, repeat: bool) -> Result<(), EngineError> {
        let mode = if repeat { PlaybackMode::Loop } else { PlaybackMode::Default };
        self.engine.set_playback_mode(mode)?;
        self.engine.play()?;
        let volume = self.volume();
        debug!(target: LOG_TARGET, "Starting stream with volume set at {}", volume);
        self.engine.set_volume(volume)
    }

    fn stop(&self) -> Result<bool, EngineError> {
        info!(target: LOG_TARGET, backend = %self.name, "Stop");
        if !self.engine.is_playing() {
            return Ok(false);
        }
        self.restore_volume()?;
        self.clear_queue()?;
        self.engine.stop()?;
        Ok(true)
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.engine.set_pause(true)
    }

    fn resume(&self) -> Result<(), EngineError> {
        self.engine.set_pause(false)
    }

    fn next(&self) -> Result<(), EngineError> {
        self.engine.next()
    }

    fn previous(&self) -> Result<(), EngineError> {
        self.engine.previous()
    }

    fn duck_volume(&self) -> Result<(), EngineError> {
        let action = {
            let mut state = lock(&self.state);
            state.ducker.duck(self.engine.is_playing(), self.engine.volume())
        };
        match action {
            DuckAction::Nothing => Ok(()),
            DuckAction::Pause => {
                debug!(target: LOG_TARGET, backend = %self.name, "Volume below duck level, pausing");
                self.pause()
            }
            DuckAction::Lower(low) => {
                debug!(target: LOG_TARGET, backend = %self.name, "Ducking volume to {}", low);
                self.engine.set_volume(low)
            }
        }
    }

    fn restore_volume(&self) -> Result<(), EngineError> {
        let action = lock(&self.state).ducker.restore();
        match action {
            RestoreAction::SetVolume(volume) => {
                debug!(target: LOG_TARGET, backend = %self.name, "Restoring volume to {}", volume);
                self.engine.set_volume(volume)
            }
            RestoreAction::Resume => self.resume(),
        }
    }

    fn track_info(&self) -> TrackInfo {
        self.engine
            .metadata()
            .map(|meta| TrackInfo::new(meta.album, meta.artist, meta.title))
            .unwrap_or_else(TrackInfo::empty)
    }

    fn seek_forward(&self, seconds: i64) -> Result<(), EngineError> {
        self.seek_by(seconds.saturating_mul(1000))
    }

    fn seek_backward(&self, seconds: i64) -> Result<(), EngineError> {
        self.seek_by(seconds.saturating_mul(1000).saturating_neg())
    }

    fn set_track_callback(&self, callback: TrackCallback) {
        *lock(&self.callback) = Some(callback);
    }

    fn shutdown(&self) {
        info!(target: LOG_TARGET, backend = %self.name, "Shutting down backend");
        if let Some(relay) = lock(&self.relay).take() {
            relay.abort();
        }
        self.engine.shutdown();
    }
}

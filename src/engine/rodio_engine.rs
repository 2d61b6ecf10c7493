// src/engine/rodio_engine.rs
use crate::engine::{
    error::EngineError,
    metadata::TrackMetadata,
    source::{BoxedSource, SourceLoader},
    EngineEvent, MediaEngine, PlaybackMode, EVENT_CHANNEL_CAPACITY, LOG_TARGET,
};
use rodio::{OutputStream, Sink};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, trace, warn};

/// How often the audio thread checks whether the current item drained.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Requests handled on the audio thread.
#[derive(Debug)]
enum ListCommand {
    Start,
    Next,
    Previous,
    Shutdown,
}

/// The media list and the list player's position in it.
#[derive(Debug, Default)]
pub(super) struct ListState {
    pub(super) items: Vec<String>,
    pub(super) index: Option<usize>,
    pub(super) mode: PlaybackMode,
    pub(super) active: bool,
    pub(super) current: Option<TrackMetadata>,
    /// Bumped whenever the list is replaced or playback is stopped, so that a
    /// load started before the change is not committed after it.
    pub(super) generation: u64,
}

impl ListState {
    /// Drops the loaded item from the sink. Nothing is reported to listeners.
    pub(super) fn detach_current(&mut self, sink: &Sink) {
        self.active = false;
        self.current = None;
        self.generation += 1;
        sink.clear();
    }
}

pub(super) fn lock_list(list: &Mutex<ListState>) -> MutexGuard<'_, ListState> {
    // A panic on the audio thread must not take the foreground down with it.
    list.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Media engine playing a list of URIs through rodio.
///
/// A dedicated audio thread owns the output stream and walks the list; the
/// shared [`Sink`] carries volume, pause, position and seek for the
/// foreground calls.
pub struct RodioEngine {
    sink: Arc<Sink>,
    list: Arc<Mutex<ListState>>,
    events: broadcast::Sender<EngineEvent>,
    command_tx: Mutex<mpsc::Sender<ListCommand>>,
    audio_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl RodioEngine {
    /// Opens the default output device and starts the audio thread.
    #[instrument]
    pub fn start() -> Result<Self, EngineError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<Arc<Sink>, EngineError>>();
        let list = Arc::new(Mutex::new(ListState::default()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let thread_list = list.clone();
        let thread_events = events.clone();
        let audio_thread = thread::Builder::new()
            .name("duckplay-audio".into())
            .spawn(move || {
                let (_stream, stream_handle) = match OutputStream::try_default() {
                    Ok(v) => v,
                    Err(e) => {
                        error!(target: LOG_TARGET, "Failed to create audio output stream: {}", e);
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };
                let sink = match Sink::try_new(&stream_handle) {
                    Ok(s) => Arc::new(s),
                    Err(e) => {
                        error!(target: LOG_TARGET, "Failed to create rodio Sink: {}", e);
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };
                sink.pause();
                if ready_tx.send(Ok(sink.clone())).is_err() {
                    return;
                }

                let worker = ListWorker {
                    sink,
                    list: thread_list,
                    events: thread_events,
                    loader: SourceLoader::new(),
                };
                worker.run(command_rx);
            })?;

        let sink = ready_rx
            .recv()
            .map_err(|_| EngineError::OutputError("audio thread exited during startup".to_string()))??;
        info!(target: LOG_TARGET, "Rodio engine started.");

        Ok(Self {
            sink,
            list,
            events,
            command_tx: Mutex::new(command_tx),
            audio_thread: Mutex::new(Some(audio_thread)),
        })
    }

    fn send(&self, command: ListCommand) -> Result<(), EngineError> {
        trace!(target: LOG_TARGET, "Sending list command: {:?}", command);
        let tx = self
            .command_tx
            .lock()
            .map_err(|_| EngineError::InvalidState("command channel poisoned".to_string()))?;
        tx.send(command)
            .map_err(|_| EngineError::InvalidState("audio thread is not running".to_string()))
    }
}

impl MediaEngine for RodioEngine {
    fn clear_list(&self) -> Result<(), EngineError> {
        let mut list = lock_list(&self.list);
        list.items.clear();
        list.index = None;
        list.detach_current(&self.sink);
        debug!(target: LOG_TARGET, "Installed empty media list.");
        Ok(())
    }

    fn add_media(&self, uri: &str) -> Result<(), EngineError> {
        let mut list = lock_list(&self.list);
        list.items.push(uri.to_string());
        trace!(target: LOG_TARGET, "Added media {} ({} items).", uri, list.items.len());
        Ok(())
    }

    fn set_playback_mode(&self, mode: PlaybackMode) -> Result<(), EngineError> {
        lock_list(&self.list).mode = mode;
        Ok(())
    }

    fn play(&self) -> Result<(), EngineError> {
        self.send(ListCommand::Start)
    }

    fn stop(&self) -> Result<(), EngineError> {
        lock_list(&self.list).detach_current(&self.sink);
        info!(target: LOG_TARGET, "List playback stopped.");
        Ok(())
    }

    fn next(&self) -> Result<(), EngineError> {
        self.send(ListCommand::Next)
    }

    fn previous(&self) -> Result<(), EngineError> {
        self.send(ListCommand::Previous)
    }

    fn set_pause(&self, paused: bool) -> Result<(), EngineError> {
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        lock_list(&self.list).active && !self.sink.is_paused()
    }

    fn volume(&self) -> u8 {
        (self.sink.volume() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    fn set_volume(&self, volume: u8) -> Result<(), EngineError> {
        self.sink.set_volume(f32::from(volume.min(100)) / 100.0);
        Ok(())
    }

    fn time_ms(&self) -> i64 {
        self.sink.get_pos().as_millis() as i64
    }

    fn length_ms(&self) -> Option<i64> {
        lock_list(&self.list)
            .current
            .as_ref()
            .and_then(|m| m.duration)
            .map(|d| d.as_millis() as i64)
    }

    fn set_time_ms(&self, position_ms: i64) -> Result<(), EngineError> {
        let target = Duration::from_millis(position_ms.max(0) as u64);
        self.sink.try_seek(target)?;
        Ok(())
    }

    fn metadata(&self) -> Option<TrackMetadata> {
        lock_list(&self.list).current.clone()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn shutdown(&self) {
        let handle = match self.audio_thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };
        if let Err(e) = self.send(ListCommand::Shutdown) {
            debug!(target: LOG_TARGET, "Audio thread already gone: {}", e);
        }
        if handle.join().is_err() {
            error!(target: LOG_TARGET, "Audio thread panicked.");
        }
        info!(target: LOG_TARGET, "Rodio engine shut down.");
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State owned by the audio thread.
pub(super) struct ListWorker {
    pub(super) sink: Arc<Sink>,
    pub(super) list: Arc<Mutex<ListState>>,
    pub(super) events: broadcast::Sender<EngineEvent>,
    pub(super) loader: SourceLoader,
}

impl ListWorker {
    fn run(self, command_rx: mpsc::Receiver<ListCommand>) {
        info!(target: LOG_TARGET, "Audio thread started.");
        loop {
            match command_rx.recv_timeout(POLL_INTERVAL) {
                Ok(ListCommand::Start) => self.start(),
                Ok(ListCommand::Next) => self.step_forward(),
                Ok(ListCommand::Previous) => self.step_backward(),
                Ok(ListCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => self.poll(),
            }
        }
        self.sink.stop();
        info!(target: LOG_TARGET, "Audio thread finished.");
    }

    fn emit(&self, event: EngineEvent) {
        trace!(target: LOG_TARGET, "Emitting engine event: {:?}", event);
        if self.events.send(event).is_err() {
            debug!(target: LOG_TARGET, "No listeners for engine event: {:?}", event);
        }
    }

    pub(super) fn start(&self) {
        let index = {
            let list = lock_list(&self.list);
            // Resume in place only while the loaded item is still part of the list.
            if list.active && list.index.is_some() && !self.sink.empty() {
                drop(list);
                debug!(target: LOG_TARGET, "Start requested while an item is loaded; resuming.");
                self.sink.play();
                return;
            }
            if list.items.is_empty() {
                warn!(target: LOG_TARGET, "Start requested with an empty media list.");
                return;
            }
            list.index.filter(|i| *i < list.items.len()).unwrap_or(0)
        };
        self.load_from(index);
    }

    pub(super) fn step_forward(&self) {
        let index = {
            let list = lock_list(&self.list);
            let len = list.items.len();
            let next = list.index.map(|i| i + 1).unwrap_or(0);
            match (next < len, list.mode) {
                (true, _) => next,
                (false, PlaybackMode::Loop) if len > 0 => 0,
                _ => {
                    debug!(target: LOG_TARGET, "Next: already at end of list.");
                    return;
                }
            }
        };
        self.load_from(index);
    }

    pub(super) fn step_backward(&self) {
        let index = {
            let list = lock_list(&self.list);
            let len = list.items.len();
            match (list.index, list.mode) {
                (Some(i), _) if i > 0 && i <= len => i - 1,
                (_, PlaybackMode::Loop) if len > 0 => len - 1,
                _ => {
                    debug!(target: LOG_TARGET, "Previous: already at start of list.");
                    return;
                }
            }
        };
        self.load_from(index);
    }

    /// Advances when the current item has drained.
    pub(super) fn poll(&self) {
        let next = {
            let mut list = lock_list(&self.list);
            if !list.active || !self.sink.empty() {
                return;
            }
            let len = list.items.len();
            let next = list.index.map(|i| i + 1).unwrap_or(0);
            if next < len {
                Some(next)
            } else if list.mode == PlaybackMode::Loop && len > 0 {
                Some(0)
            } else {
                list.active = false;
                None
            }
        };

        match next {
            Some(index) => self.load_from(index),
            None => {
                info!(target: LOG_TARGET, "Reached end of media list.");
                self.emit(EngineEvent::QueueEnded);
            }
        }
    }

    /// Loads the first playable item starting at `start`, skipping items that
    /// fail to open. Emits `QueueEnded` if nothing in the remaining list plays.
    pub(super) fn load_from(&self, start: usize) {
        let (generation, candidates, mode) = {
            let list = lock_list(&self.list);
            let len = list.items.len();
            let order: Vec<usize> = match list.mode {
                PlaybackMode::Loop => (0..len).map(|offset| (start + offset) % len).collect(),
                PlaybackMode::Default => (start..len).collect(),
            };
            let candidates: Vec<(usize, String)> = order
                .into_iter()
                .map(|i| (i, list.items[i].clone()))
                .collect();
            (list.generation, candidates, list.mode)
        };

        for (index, uri) in candidates {
            // The list lock is released while loading; http fetches can be slow.
            let loaded = self
                .loader
                .open(&uri)
                .and_then(|source| Ok((source.decoder()?, source.metadata())));

            let (decoder, metadata) = match loaded {
                Ok(v) => v,
                Err(e) => {
                    error!(target: LOG_TARGET, "Failed to play list item {} ({}): {}", index, uri, e);
                    continue;
                }
            };

            if self.commit(generation, index, &uri, decoder, metadata) {
                info!(target: LOG_TARGET, "Playing list item {}: {}", index, uri);
                self.emit(EngineEvent::TrackStarted);
            }
            return;
        }

        let mut list = lock_list(&self.list);
        if list.generation != generation {
            return;
        }
        warn!(target: LOG_TARGET, "No playable item left in media list (mode {:?}).", mode);
        list.active = false;
        drop(list);
        self.emit(EngineEvent::QueueEnded);
    }

    /// Installs a loaded item unless the list changed since `generation`.
    pub(super) fn commit(
        &self,
        generation: u64,
        index: usize,
        uri: &str,
        decoder: BoxedSource,
        metadata: TrackMetadata,
    ) -> bool {
        let mut list = lock_list(&self.list);
        if list.generation != generation {
            debug!(target: LOG_TARGET, "Media list changed while loading {}; dropping it.", uri);
            return false;
        }
        self.sink.clear();
        self.sink.append(decoder);
        self.sink.play();
        list.index = Some(index);
        list.current = Some(metadata.with_fallback_title(uri));
        list.active = true;
        true
    }
}

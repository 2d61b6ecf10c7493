/// Default duck level in percent.
pub const DEFAULT_LOW_VOLUME: u8 = 30;

/// What the adapter must do to the engine when ducking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckAction {
    /// Already ducked, not playing or ducking disabled.
    Nothing,
    /// Playback was quieter than the duck level; pause instead.
    Pause,
    /// Lower the engine volume to the given level.
    Lower(u8),
}

/// What the adapter must do to the engine when restoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreAction {
    SetVolume(u8),
    Resume,
}

/// Remembers the pre-duck volume while the assistant is listening or speaking.
///
/// `normal_volume` is `Some` exactly while playback is ducked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDucker {
    normal_volume: Option<u8>,
    low_volume: u8,
    enabled: bool,
}

impl Default for VolumeDucker {
    fn default() -> Self {
        VolumeDucker::new(false, DEFAULT_LOW_VOLUME)
    }
}

impl VolumeDucker {
    pub fn new(enabled: bool, low_volume: u8) -> Self {
        VolumeDucker {
            normal_volume: None,
            low_volume: low_volume.min(100),
            enabled,
        }
    }

    pub fn is_ducked(&self) -> bool {
        self.normal_volume.is_some()
    }

    pub fn normal_volume(&self) -> Option<u8> {
        self.normal_volume
    }

    pub fn low_volume(&self) -> u8 {
        self.low_volume
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Captures `current_volume` and decides how to duck.
    pub fn duck(&mut self, playing: bool, current_volume: u8) -> DuckAction {
        if self.normal_volume.is_some() || !playing || !self.enabled {
            return DuckAction::Nothing;
        }
        self.normal_volume = Some(current_volume);
        if current_volume < self.low_volume {
            DuckAction::Pause
        } else {
            DuckAction::Lower(self.low_volume)
        }
    }

    /// Forgets the captured volume and decides how to undo the duck.
    ///
    /// Anything but a captured volume above the duck level resumes playback,
    /// including the case where nothing was ducked.
    pub fn restore(&mut self) -> RestoreAction {
        match self.normal_volume.take() {
            Some(volume) if volume > self.low_volume => RestoreAction::SetVolume(volume),
            _ => RestoreAction::Resume,
        }
    }
}

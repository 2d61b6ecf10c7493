//! Translates bus messages into audio service commands.

use super::{ServiceCommand, LOG_TARGET};
use crate::backend::TrackEntry;
use crate::bus::Message;
use serde_json::Value;
use tracing::{trace, warn};

pub const PLAY: &str = "mycroft.audio.service.play";
pub const QUEUE: &str = "mycroft.audio.service.queue";
pub const STOP: &str = "mycroft.audio.service.stop";
pub const PAUSE: &str = "mycroft.audio.service.pause";
pub const RESUME: &str = "mycroft.audio.service.resume";
pub const NEXT: &str = "mycroft.audio.service.next";
pub const PREV: &str = "mycroft.audio.service.prev";
pub const SEEK_FORWARD: &str = "mycroft.audio.service.seek_forward";
pub const SEEK_BACKWARD: &str = "mycroft.audio.service.seek_backward";
pub const TRACK_INFO: &str = "mycroft.audio.service.track_info";
pub const LIST_BACKENDS: &str = "mycroft.audio.service.list_backends";
/// Global stop request.
pub const GLOBAL_STOP: &str = "mycroft.stop";

const DUCK_MESSAGES: &[&str] = &["recognizer_loop:record_begin", "recognizer_loop:audio_output_start"];
const RESTORE_MESSAGES: &[&str] = &["recognizer_loop:record_end", "recognizer_loop:audio_output_end"];

/// Seek distance when a seek message carries no `seconds`.
const DEFAULT_SEEK_SECONDS: i64 = 1;

/// Maps a bus message to the command it requests, `None` for messages the
/// service does not handle.
pub fn message_to_command(message: &Message) -> Option<ServiceCommand> {
    let msg_type = message.msg_type.as_str();
    let command = match msg_type {
        PLAY => ServiceCommand::Play {
            tracks: parse_tracks(message),
            repeat: message.get("repeat").and_then(Value::as_bool).unwrap_or(false),
        },
        QUEUE => ServiceCommand::Queue {
            tracks: parse_tracks(message),
        },
        STOP | GLOBAL_STOP => ServiceCommand::Stop,
        PAUSE => ServiceCommand::Pause,
        RESUME => ServiceCommand::Resume,
        NEXT => ServiceCommand::Next,
        PREV => ServiceCommand::Previous,
        SEEK_FORWARD => ServiceCommand::SeekForward {
            seconds: parse_seconds(message),
        },
        SEEK_BACKWARD => ServiceCommand::SeekBackward {
            seconds: parse_seconds(message),
        },
        TRACK_INFO => ServiceCommand::TrackInfo {
            request: message.clone(),
        },
        LIST_BACKENDS => ServiceCommand::ListBackends {
            request: message.clone(),
        },
        t if DUCK_MESSAGES.contains(&t) => ServiceCommand::Duck,
        t if RESTORE_MESSAGES.contains(&t) => ServiceCommand::Restore,
        _ => {
            trace!(target: LOG_TARGET, "Ignoring bus message {}", msg_type);
            return None;
        }
    };
    Some(command)
}

/// Reads `data.tracks`. Entries that are neither a string nor a list of
/// strings are dropped.
fn parse_tracks(message: &Message) -> Vec<TrackEntry> {
    let Some(Value::Array(items)) = message.get("tracks") else {
        warn!(target: LOG_TARGET, "{} without a track list", message.msg_type);
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<TrackEntry>(item.clone()) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!(target: LOG_TARGET, "Dropping malformed track {}: {}", item, e);
                None
            }
        })
        .collect()
}

/// Reads `data.seconds`, accepting integers and floats.
fn parse_seconds(message: &Message) -> i64 {
    match message.get("seconds") {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .unwrap_or(DEFAULT_SEEK_SECONDS),
        None => DEFAULT_SEEK_SECONDS,
    }
}

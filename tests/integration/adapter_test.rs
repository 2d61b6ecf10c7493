//! Integration tests for the playback adapter over a scripted engine

use crate::test_utils::FakeEngine;
use duckplay::backend::{spawn_event_relay, AudioBackend, PlaybackAdapter, TrackEntry, VolumeDucker};
use duckplay::engine::MediaEngine;
use duckplay::engine::PlaybackMode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(test)]
mod adapter_integration_tests {
    use super::*;

    fn ducking_adapter(volume: u8) -> Arc<PlaybackAdapter<FakeEngine>> {
        Arc::new(PlaybackAdapter::new(
            "vlc",
            Arc::new(FakeEngine::new()),
            volume,
            VolumeDucker::new(true, 30),
        ))
    }

    /// Play, duck while the assistant speaks, restore, seek and stop.
    #[test]
    fn test_voice_interaction_cycle() {
        let adapter = ducking_adapter(80);
        let tracks = vec![
            TrackEntry::from("file:///music/one.mp3"),
            TrackEntry::Wrapped(vec!["https://radio.example/stream.mp3".into(), "audio/mpeg".into()]),
        ];

        adapter.clear_queue().unwrap();
        adapter.enqueue(&tracks).unwrap();
        adapter.play(true).unwrap();
        {
            let engine = adapter.engine().state();
            assert_eq!(engine.mode, PlaybackMode::Loop);
            assert_eq!(engine.volume, 80);
            assert_eq!(engine.media.len(), 2);
        }

        // Listening, then speaking: only the first duck takes effect.
        adapter.duck_volume().unwrap();
        adapter.duck_volume().unwrap();
        assert_eq!(adapter.engine().volume(), 30);
        assert_eq!(adapter.ducker().normal_volume(), Some(80));

        adapter.restore_volume().unwrap();
        assert_eq!(adapter.engine().volume(), 80);
        assert!(!adapter.is_ducked());

        adapter.engine().state().length_ms = Some(60_000);
        adapter.engine().state().time_ms = 55_000;
        adapter.seek_forward(30).unwrap();
        assert_eq!(adapter.engine().state().time_ms, 60_000);
        adapter.seek_backward(90).unwrap();
        assert_eq!(adapter.engine().state().time_ms, 0);

        assert!(adapter.stop().unwrap());
        assert!(adapter.engine().state().media.is_empty());
        assert!(!adapter.stop().unwrap());
    }

    /// Quiet playback is paused rather than lowered, and resumed afterwards.
    #[test]
    fn test_quiet_playback_pauses_while_ducked() {
        let adapter = ducking_adapter(20);
        adapter.enqueue(&[TrackEntry::from("file:///a.ogg")]).unwrap();
        adapter.play(false).unwrap();

        adapter.duck_volume().unwrap();
        assert!(adapter.engine().state().paused);
        assert_eq!(adapter.engine().state().volume_calls, vec![20]);

        adapter.restore_volume().unwrap();
        assert!(!adapter.engine().state().paused);
        assert!(adapter.engine().is_playing());
    }

    /// Engine events reach the host callback through the relay task.
    #[tokio::test]
    async fn test_track_changes_reach_callback() {
        let adapter = ducking_adapter(50);
        let (tx, mut rx) = mpsc::unbounded_channel();
        adapter.set_track_callback(Arc::new(move |name| {
            let _ = tx.send(name);
        }));
        spawn_event_relay(&adapter);

        adapter.engine().start_track("Blue in Green", "Miles Davis");
        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(first, Some(Some("Blue in Green".to_string())));

        let info = adapter.track_info();
        assert_eq!(info.artists, vec![Some("Miles Davis".to_string())]);

        adapter.engine().end_queue();
        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(second, Some(None));

        // Exactly one notification per event.
        assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err());

        adapter.shutdown();
        assert!(adapter.engine().state().shutdown);
    }
}

//! Integration tests for the bus-driven audio service over real adapters

use crate::test_utils::{next_of_type, FakeEngine, LoopbackBus};
use duckplay::backend::{load_services, AudioBackend, PlaybackAdapter};
use duckplay::engine::MediaEngine;
use duckplay::bus::{Message, MessageBus, DEFAULT_RESPONSE_TIMEOUT};
use duckplay::config::{AudioSettings, BackendConfig};
use duckplay::service::{AudioService, ServiceCommand, PLAYING_TRACK, QUEUE_END, TRACK_INFO_REPLY};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod service_integration_tests {
    use super::*;

    async fn start(
        bus: Arc<LoopbackBus>,
    ) -> (
        Arc<PlaybackAdapter<FakeEngine>>,
        tokio::sync::mpsc::Sender<ServiceCommand>,
        tokio::task::JoinHandle<()>,
    ) {
        let mut audio = AudioSettings {
            default_backend: Some("vlc".to_string()),
            backends: Default::default(),
        };
        audio.backends.insert(
            "vlc".to_string(),
            BackendConfig {
                duck: true,
                ..BackendConfig::new("vlc")
            },
        );

        let services = load_services(&audio, &*bus, Duration::from_millis(500), |_, _| Ok(FakeEngine::new())).await;
        let adapter = services[0].clone();
        let backends: Vec<Arc<dyn AudioBackend>> = vec![adapter.clone()];
        let (service, command_tx) = AudioService::new(bus, backends, audio.default_backend.clone());
        (adapter, command_tx, tokio::spawn(service.run()))
    }

    /// Round trip through the bus so that earlier messages are processed.
    async fn sync(bus: &LoopbackBus) -> Message {
        bus.wait_for_response(
            Message::new("mycroft.audio.service.track_info"),
            Some(TRACK_INFO_REPLY),
            DEFAULT_RESPONSE_TIMEOUT,
        )
        .await
        .expect("track info reply")
    }

    #[tokio::test]
    async fn test_play_duck_and_track_notifications() {
        let bus = LoopbackBus::with_system_volume(0.6);
        let (adapter, command_tx, handle) = start(bus.clone()).await;
        assert_eq!(adapter.volume(), 60);
        let mut observer = bus.subscribe();

        bus.emit(Message::with_data(
            "mycroft.audio.service.play",
            json!({"tracks": ["file:///music/a.mp3", "file:///music/b.mp3"], "repeat": false}),
        ))
        .await
        .unwrap();
        sync(&bus).await;
        assert_eq!(adapter.engine().state().media.len(), 2);
        assert_eq!(adapter.engine().volume(), 60);

        // Track start travels engine -> relay -> callback -> service -> bus.
        adapter.engine().start_track("Song A", "Artist");
        let playing = next_of_type(&mut observer, PLAYING_TRACK).await;
        assert_eq!(playing.get("track"), Some(&json!("Song A")));

        bus.emit(Message::new("recognizer_loop:record_begin")).await.unwrap();
        sync(&bus).await;
        assert_eq!(adapter.engine().volume(), 30);

        bus.emit(Message::new("recognizer_loop:audio_output_end")).await.unwrap();
        let info = sync(&bus).await;
        assert_eq!(adapter.engine().volume(), 60);
        assert_eq!(info.get("name"), Some(&json!("Song A")));
        assert_eq!(info.get("artists"), Some(&json!(["Artist"])));

        adapter.engine().end_queue();
        next_of_type(&mut observer, QUEUE_END).await;

        command_tx.send(ServiceCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
        assert!(adapter.engine().state().shutdown);
    }

    #[tokio::test]
    async fn test_queue_seek_and_stop() {
        let bus = LoopbackBus::new();
        let (adapter, command_tx, handle) = start(bus.clone()).await;
        assert_eq!(adapter.volume(), 50);

        // Queue with nothing playing starts playback.
        bus.emit(Message::with_data(
            "mycroft.audio.service.queue",
            json!({"tracks": [["http://radio/a.mp3", "audio/mpeg"]]}),
        ))
        .await
        .unwrap();
        bus.emit(Message::with_data(
            "mycroft.audio.service.queue",
            json!({"tracks": ["http://radio/b.mp3"]}),
        ))
        .await
        .unwrap();
        sync(&bus).await;
        assert_eq!(adapter.engine().state().media, vec!["http://radio/a.mp3", "http://radio/b.mp3"]);
        assert!(adapter.engine().is_playing());

        adapter.engine().state().length_ms = Some(20_000);
        bus.emit(Message::with_data("mycroft.audio.service.seek_forward", json!({"seconds": 45})))
            .await
            .unwrap();
        sync(&bus).await;
        assert_eq!(adapter.engine().state().time_ms, 20_000);

        bus.emit(Message::new("mycroft.audio.service.pause")).await.unwrap();
        sync(&bus).await;
        assert!(adapter.engine().state().paused);

        bus.emit(Message::new("mycroft.audio.service.resume")).await.unwrap();
        bus.emit(Message::new("mycroft.audio.service.stop")).await.unwrap();
        sync(&bus).await;
        assert!(!adapter.engine().is_playing());
        assert!(adapter.engine().state().media.is_empty());
        assert!(bus.sent_types().iter().any(|t| t == "mycroft.stop.handled"));

        command_tx.send(ServiceCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_scheme_leaves_backend_idle() {
        let bus = LoopbackBus::new();
        let (adapter, command_tx, handle) = start(bus.clone()).await;

        bus.emit(Message::with_data(
            "mycroft.audio.service.play",
            json!({"tracks": ["spotify:track:42"]}),
        ))
        .await
        .unwrap();
        let info = sync(&bus).await;
        assert!(info.data.is_empty());
        assert!(adapter.engine().state().media.is_empty());

        command_tx.send(ServiceCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}

//! Integration tests for backend registration

use crate::test_utils::{FakeEngine, LoopbackBus};
use duckplay::backend::{load_services, AudioBackend, TrackEntry};
use duckplay::engine::MediaEngine;
use duckplay::config::{AudioSettings, BackendConfig};
use std::collections::BTreeMap;
use std::time::Duration;

#[cfg(test)]
mod registry_integration_tests {
    use super::*;

    fn audio(entries: &[(&str, BackendConfig)]) -> AudioSettings {
        let backends: BTreeMap<String, BackendConfig> =
            entries.iter().map(|(name, cfg)| (name.to_string(), cfg.clone())).collect();
        AudioSettings {
            default_backend: None,
            backends,
        }
    }

    #[tokio::test]
    async fn test_start_volume_from_host() {
        let bus = LoopbackBus::with_system_volume(0.8);
        let audio = audio(&[("vlc", BackendConfig::new("vlc"))]);

        let services = load_services(&audio, &*bus, Duration::from_millis(500), |_, _| Ok(FakeEngine::new())).await;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].volume(), 80);

        services[0].enqueue(&[TrackEntry::from("file:///a.mp3")]).unwrap();
        services[0].play(false).unwrap();
        assert_eq!(services[0].engine().volume(), 80);
        assert_eq!(bus.sent_types(), vec!["mycroft.volume.get"]);
    }

    #[tokio::test]
    async fn test_configured_volume_skips_query() {
        let bus = LoopbackBus::with_system_volume(0.8);
        let audio = audio(&[(
            "vlc",
            BackendConfig {
                volume: Some(35),
                ..BackendConfig::new("vlc")
            },
        )]);

        let services = load_services(&audio, &*bus, Duration::from_millis(500), |_, _| Ok(FakeEngine::new())).await;
        assert_eq!(services[0].volume(), 35);
        assert!(bus.sent_types().is_empty());
    }

    #[tokio::test]
    async fn test_silent_host_falls_back_to_default_volume() {
        let bus = LoopbackBus::new();
        let audio = audio(&[
            ("vlc", BackendConfig::new("vlc")),
            ("off", BackendConfig { active: false, ..BackendConfig::new("vlc") }),
            ("simple", BackendConfig::new("simple")),
        ]);

        let services = load_services(&audio, &*bus, Duration::from_millis(50), |_, _| Ok(FakeEngine::new())).await;
        let names: Vec<&str> = services.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["vlc"]);
        assert_eq!(services[0].volume(), 50);
    }

    #[tokio::test]
    async fn test_backend_options_are_applied() {
        let bus = LoopbackBus::new();
        let audio = audio(&[(
            "kitchen",
            BackendConfig {
                duck: true,
                low_volume: 10,
                volume: Some(90),
                ..BackendConfig::new("rodio")
            },
        )]);

        let services = load_services(&audio, &*bus, Duration::from_millis(50), |_, _| Ok(FakeEngine::new())).await;
        let ducker = services[0].ducker();
        assert!(ducker.enabled());
        assert_eq!(ducker.low_volume(), 10);
        assert_eq!(services[0].supported_schemes(), &["file", "http", "https"]);
    }
}

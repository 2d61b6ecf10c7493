//! Integration tests for configuration management
//!
//! These tests verify that the configuration system works correctly
//! across module boundaries.

use duckplay::backend::is_supported_type;
use duckplay::cli::Args;
use duckplay::config::{BackendConfig, Settings};
use std::error::Error;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    /// Test complete configuration workflow
    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.bus.host = "192.168.1.20".to_string();
        settings.audio.backends.insert(
            "bedroom".to_string(),
            BackendConfig {
                duck: true,
                low_volume: 15,
                ..BackendConfig::new("vlc")
            },
        );

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded.bus.url(), "ws://192.168.1.20:8181/core");
        assert_eq!(loaded.audio.backends["bedroom"].low_volume, 15);

        // CLI overrides apply on top of the file
        let args = Args {
            bus_port: Some(8282),
            default_backend: Some("bedroom".to_string()),
            ..Default::default()
        };
        let mut updated = loaded;
        args.apply_to(&mut updated);
        updated.validate()?;
        updated.save(&config_path)?;

        let reloaded = Settings::load(&config_path)?;
        assert_eq!(reloaded.bus.port, 8282);
        assert_eq!(reloaded.audio.default_backend.as_deref(), Some("bedroom"));

        Ok(())
    }

    /// A host-style config with foreign backend types still loads; only the
    /// supported entries are picked up later.
    #[test]
    fn test_host_style_config() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{
                "bus": {"host": "127.0.0.1", "port": 8181, "route": "/core", "ssl": false},
                "audio": {
                    "default-backend": "local",
                    "backends": {
                        "local": {"type": "simple", "active": true},
                        "vlc": {"type": "vlc", "active": true, "duck": true},
                        "chromecast": {"type": "chromecast", "active": false}
                    }
                }
            }"#,
        )?;

        let settings = Settings::load(&config_path)?;
        settings.validate()?;

        let supported: Vec<&String> = settings
            .audio
            .backends
            .iter()
            .filter(|(_, b)| is_supported_type(&b.backend_type))
            .map(|(name, _)| name)
            .collect();
        assert_eq!(supported, vec!["vlc"]);
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"audio": {"default-backend": "nowhere", "backends": {}}}"#,
        )?;

        let settings = Settings::load(&config_path)?;
        assert!(settings.validate().is_err());
        Ok(())
    }
}

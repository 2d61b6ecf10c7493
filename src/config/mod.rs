//! Configuration file handling

mod settings;

pub use settings::{AudioSettings, BackendConfig, BusSettings, ConfigError, Settings};

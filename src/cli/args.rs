//! Command-line arguments

use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for duckplay
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Playlist backend with volume ducking for a voice assistant", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, env = "DUCKPLAY_CONFIG")]
    pub config: Option<String>,

    /// Message bus host
    #[arg(long, env = "DUCKPLAY_BUS_HOST")]
    pub bus_host: Option<String>,

    /// Message bus port
    #[arg(long, env = "DUCKPLAY_BUS_PORT")]
    pub bus_port: Option<u16>,

    /// Message bus websocket route
    #[arg(long, env = "DUCKPLAY_BUS_ROUTE")]
    pub bus_route: Option<String>,

    /// Backend to prefer when it supports the requested tracks
    #[arg(short = 'b', long, env = "DUCKPLAY_DEFAULT_BACKEND")]
    pub default_backend: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    pub save_config: bool,
}

impl Args {
    /// Config file to use: `--config`, else the default location.
    pub fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => PathBuf::from(path),
            None => Settings::default_path(),
        }
    }

    /// Overrides file settings with the arguments that were given.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(host) = &self.bus_host {
            settings.bus.host = host.clone();
        }
        if let Some(port) = self.bus_port {
            settings.bus.port = port;
        }
        if let Some(route) = &self.bus_route {
            settings.bus.route = route.clone();
        }
        if let Some(backend) = &self.default_backend {
            settings.audio.default_backend = Some(backend.clone());
        }
    }
}

/// Command-line front end
pub struct Cli {
    pub args: Args,
}

impl Cli {
    /// Parses the process arguments.
    pub fn new() -> Self {
        Cli { args: Args::parse() }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

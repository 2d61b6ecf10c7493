use crate::engine::{
    error::EngineError,
    metadata::{probe_metadata, TrackMetadata},
    LOG_TARGET,
};
use rodio::{Decoder, Source};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded-on-demand audio handed to the sink.
pub type BoxedSource = Box<dyn Source<Item = i16> + Send>;

/// A list item resolved to readable bytes.
#[derive(Debug, Clone)]
pub enum MediaSource {
    File(PathBuf),
    Memory {
        bytes: Arc<[u8]>,
        extension: Option<String>,
    },
}

impl MediaSource {
    fn extension(&self) -> Option<String> {
        match self {
            MediaSource::File(path) => path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase()),
            MediaSource::Memory { extension, .. } => extension.clone(),
        }
    }

    /// Creates a fresh decoder positioned at the start of the media.
    pub fn decoder(&self) -> Result<BoxedSource, EngineError> {
        match self {
            MediaSource::File(path) => {
                let file = File::open(path)?;
                Ok(Box::new(Decoder::new(BufReader::new(file))?))
            }
            MediaSource::Memory { bytes, .. } => Ok(Box::new(Decoder::new(Cursor::new(bytes.clone()))?)),
        }
    }

    /// Probes tags and duration. Failures are not fatal for playback.
    pub fn metadata(&self) -> TrackMetadata {
        let extension = self.extension();
        let result = match self {
            MediaSource::File(path) => File::open(path)
                .map_err(EngineError::from)
                .and_then(|file| probe_metadata(Box::new(file), extension.as_deref())),
            MediaSource::Memory { bytes, .. } => {
                probe_metadata(Box::new(Cursor::new(bytes.clone())), extension.as_deref())
            }
        };
        result.unwrap_or_else(|e| {
            warn!(target: LOG_TARGET, "Metadata probe failed: {}", e);
            TrackMetadata::default()
        })
    }
}

/// Resolves list URIs into [`MediaSource`]s.
///
/// Owns a blocking HTTP client, so it must live on a plain thread rather than
/// inside the async runtime.
pub struct SourceLoader {
    http: reqwest::blocking::Client,
}

impl SourceLoader {
    pub fn new() -> Self {
        let http = match reqwest::blocking::Client::builder().timeout(HTTP_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(target: LOG_TARGET, "Error creating HTTP client with timeout: {:?}. Falling back to default.", e);
                reqwest::blocking::Client::new()
            }
        };
        Self { http }
    }

    /// Opens `uri`. `file` URIs and bare paths are read from disk, `http` and
    /// `https` are fetched into memory, anything else is rejected.
    #[instrument(skip(self))]
    pub fn open(&self, uri: &str) -> Result<MediaSource, EngineError> {
        let parsed = match Url::parse(uri) {
            Ok(url) => url,
            Err(_) => return Self::open_path(Path::new(uri)),
        };

        match parsed.scheme() {
            "file" => {
                let path = parsed.to_file_path().map_err(|_| EngineError::LoadError {
                    uri: uri.to_string(),
                    reason: "not a valid local file URI".to_string(),
                })?;
                Self::open_path(&path)
            }
            "http" | "https" => self.fetch(parsed),
            other => Err(EngineError::UnsupportedScheme(other.to_string())),
        }
    }

    fn open_path(path: &Path) -> Result<MediaSource, EngineError> {
        // Fail now rather than on the audio callback.
        File::open(path)?;
        debug!(target: LOG_TARGET, "Resolved local media: {}", path.display());
        Ok(MediaSource::File(path.to_path_buf()))
    }

    fn fetch(&self, url: Url) -> Result<MediaSource, EngineError> {
        info!(target: LOG_TARGET, "Fetching remote media: {}", url);
        let extension = url
            .path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| Path::new(name).extension())
            .map(|e| e.to_string_lossy().to_lowercase());

        let response = self.http.get(url.clone()).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        debug!(target: LOG_TARGET, "Fetched {} bytes from {}", bytes.len(), url);

        Ok(MediaSource::Memory {
            bytes: Arc::from(&bytes[..]),
            extension,
        })
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

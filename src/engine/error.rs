use std::error::Error;
use std::io;
use symphonia::core::errors::Error as SymphoniaError;

/// Error types raised by the media engine.
#[derive(Debug)]
pub enum EngineError {
    OutputError(String),
    LoadError { uri: String, reason: String },
    UnsupportedScheme(String),
    NetworkError(reqwest::Error),
    IoError(io::Error),
    DecodingError(String),
    SeekError(String),
    InvalidState(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::OutputError(e) => write!(f, "Audio output error: {}", e),
            EngineError::LoadError { uri, reason } => write!(f, "Failed to load {}: {}", uri, reason),
            EngineError::UnsupportedScheme(s) => write!(f, "Unsupported URI scheme: {}", s),
            EngineError::NetworkError(e) => write!(f, "Network error: {}", e),
            EngineError::IoError(e) => write!(f, "I/O error: {}", e),
            EngineError::DecodingError(e) => write!(f, "Decoding error: {}", e),
            EngineError::SeekError(e) => write!(f, "Seek error: {}", e),
            EngineError::InvalidState(s) => write!(f, "Invalid state: {}", s),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::NetworkError(e) => Some(e),
            EngineError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::IoError(e)
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::NetworkError(e)
    }
}

impl From<SymphoniaError> for EngineError {
    fn from(e: SymphoniaError) -> Self {
        EngineError::DecodingError(e.to_string())
    }
}

impl From<rodio::decoder::DecoderError> for EngineError {
    fn from(e: rodio::decoder::DecoderError) -> Self {
        EngineError::DecodingError(e.to_string())
    }
}

impl From<rodio::StreamError> for EngineError {
    fn from(e: rodio::StreamError) -> Self {
        EngineError::OutputError(e.to_string())
    }
}

impl From<rodio::PlayError> for EngineError {
    fn from(e: rodio::PlayError) -> Self {
        EngineError::OutputError(e.to_string())
    }
}

impl From<rodio::source::SeekError> for EngineError {
    fn from(e: rodio::source::SeekError) -> Self {
        EngineError::SeekError(e.to_string())
    }
}

use crate::bus::BusError;
use crate::engine::EngineError;
use std::error::Error;
use std::fmt;

/// Error types for audio service operations
#[derive(Debug)]
pub enum ServiceError {
    /// No backend supports the requested tracks.
    NoBackend(String),
    Engine(EngineError),
    Bus(BusError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NoBackend(msg) => write!(f, "No suitable backend: {}", msg),
            ServiceError::Engine(e) => write!(f, "Backend error: {}", e),
            ServiceError::Bus(e) => write!(f, "Bus error: {}", e),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServiceError::Engine(e) => Some(e),
            ServiceError::Bus(e) => Some(e),
            ServiceError::NoBackend(_) => None,
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        ServiceError::Engine(err)
    }
}

impl From<BusError> for ServiceError {
    fn from(err: BusError) -> Self {
        ServiceError::Bus(err)
    }
}

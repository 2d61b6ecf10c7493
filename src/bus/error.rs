use std::error::Error;
use std::fmt;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Error types for message bus operations
#[derive(Debug)]
pub enum BusError {
    InvalidUrl(String),
    WebSocket(WsError),
    Serialization(serde_json::Error),
    Closed,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::InvalidUrl(msg) => write!(f, "Invalid bus URL: {}", msg),
            BusError::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            BusError::Serialization(e) => write!(f, "Serialization error: {}", e),
            BusError::Closed => write!(f, "Message bus connection closed"),
        }
    }
}

impl Error for BusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BusError::WebSocket(e) => Some(e),
            BusError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WsError> for BusError {
    fn from(err: WsError) -> Self {
        BusError::WebSocket(err)
    }
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::Serialization(err)
    }
}

impl From<url::ParseError> for BusError {
    fn from(err: url::ParseError) -> Self {
        BusError::InvalidUrl(err.to_string())
    }
}

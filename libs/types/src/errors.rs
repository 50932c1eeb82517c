//! Error types for the live event feed
//!
//! Comprehensive error taxonomy using thiserror. None of these are fatal:
//! decode errors drop a frame, transport errors drive a reconnect, format
//! errors fall back to the generic renderer.

use thiserror::Error;

/// Top-level feed error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// A frame that could not be turned into an event envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed JSON: {0}")]
    Json(String),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Missing or invalid field: {0}")]
    MissingField(&'static str),
}

/// Push-connection failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request failed: {message}")]
    Request { message: String },

    #[error("Unexpected status: {status}")]
    Status { status: u16 },

    #[error("Stream failed: {message}")]
    Stream { message: String },
}

/// A known event whose payload did not fit its template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Payload for {event_type} has unexpected shape: {reason}")]
    PayloadShape { event_type: String, reason: String },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("History capacity must be at least 1")]
    ZeroCapacity,

    #[error("Origin must be an http(s) URL: {0}")]
    InvalidOrigin(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::MissingField("type");
        assert_eq!(err.to_string(), "Missing or invalid field: type");
    }

    #[test]
    fn test_transport_error_status() {
        let err = TransportError::Status { status: 502 };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_feed_error_from_decode_error() {
        let feed_err: FeedError = DecodeError::NotAnObject.into();
        assert!(matches!(feed_err, FeedError::Decode(_)));
    }

    #[test]
    fn test_format_error_names_event() {
        let err = FormatError::PayloadShape {
            event_type: "trade".to_string(),
            reason: "expected scalar".to_string(),
        };
        assert!(err.to_string().contains("trade"));
    }
}

//! # Error Types
//!
//! Custom error types for the telemetry pipeline using `thiserror`.
//!
//! Link and decode failures are separate types so the poll loop can tell
//! transport trouble apart from garbled frames when it logs and counts them.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the telemetry ground station
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport errors
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// Frame decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Failure to acquire a raw frame from a link
#[derive(Debug, Error)]
pub enum LinkError {
    /// No USB device with the expected vendor/product id is attached
    #[error("USB device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// Serial port could not be opened
    #[error("Failed to open serial port {port}: {reason}")]
    SerialOpen { port: String, reason: String },

    /// USB transfer failed (busy, pipe error, disconnect...)
    #[error("USB transfer failed: {0}")]
    Usb(#[from] rusb::Error),

    /// Serial I/O failed
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// No complete frame arrived before the read deadline
    #[error("Timed out after {0:?} waiting for a frame")]
    Timeout(Duration),

    /// Transport closed before a complete frame arrived
    #[error("Short read: {received} bytes without a frame terminator")]
    ShortRead { received: usize },

    /// Blocking transfer worker did not complete
    #[error("Transfer worker failed: {0}")]
    Worker(String),
}

impl LinkError {
    /// Whether this failure should abort startup rather than be retried
    /// on the next poll tick.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LinkError::DeviceNotFound { .. } | LinkError::SerialOpen { .. }
        )
    }
}

/// Rejection of a raw frame by one of the decoders
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Binary frame shorter than the fixed layout
    #[error("Frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// Text frame was empty or only whitespace
    #[error("Empty line")]
    EmptyLine,

    /// Text frame had fewer comma-separated fields than required
    #[error("Too few fields: expected at least {expected}, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    /// A numeric field did not parse
    #[error("Field {index} is not a number: {value:?}")]
    InvalidField { index: usize, value: String },

    /// Text frame was not valid UTF-8
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
}

/// Result type alias for the telemetry ground station
pub type Result<T> = std::result::Result<T, TelemetryError>;

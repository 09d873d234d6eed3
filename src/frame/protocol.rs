//! # Telemetry Frame Constants and Types
//!
//! Wire layout of the payload's binary frame, CSV field positions, unit
//! scaling and the decoded sample types.

use serde::Serialize;
use std::fmt;

/// Meaningful length of a binary frame
pub const BINARY_FRAME_LEN: usize = 29;

/// Bytes requested by the USB IN transfer (device pads to 32)
pub const USB_TRANSFER_LEN: usize = 32;

/// Byte offsets of each binary field
pub const OFFSET_HOURS: usize = 0;
pub const OFFSET_MINUTES: usize = 1;
pub const OFFSET_SECONDS: usize = 2;
pub const OFFSET_MICROSECONDS: usize = 3;
pub const OFFSET_LATITUDE: usize = 7;
pub const OFFSET_LONGITUDE: usize = 11;
pub const OFFSET_ALTITUDE: usize = 15;
pub const OFFSET_TEMPERATURE: usize = 19;
pub const OFFSET_PRESSURE: usize = 21;
pub const OFFSET_ACCEL_X: usize = 23;
pub const OFFSET_ACCEL_Y: usize = 25;
pub const OFFSET_ACCEL_Z: usize = 27;

/// Latitude/longitude are degrees × 10^6
pub const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Temperature is (raw / 10) - 5
pub const TEMPERATURE_SCALE: f64 = 10.0;
pub const TEMPERATURE_OFFSET: f64 = -5.0;

/// Pressure is raw / 10 millibar
pub const PRESSURE_SCALE: f64 = 10.0;

/// Acceleration is raw / 20 g
pub const ACCEL_SCALE: f64 = 20.0;

/// Minimum number of comma-separated fields in a CSV frame
pub const CSV_MIN_FIELDS: usize = 9;

/// CSV field positions (0 is unused, 3 is not decoded)
pub const CSV_FIELD_LATITUDE: usize = 1;
pub const CSV_FIELD_LONGITUDE: usize = 2;
pub const CSV_FIELD_TEMPERATURE: usize = 4;
pub const CSV_FIELD_PRESSURE: usize = 5;
pub const CSV_FIELD_ACCEL_X: usize = 6;
pub const CSV_FIELD_ACCEL_Y: usize = 7;
pub const CSV_FIELD_ACCEL_Z: usize = 8;

/// Subtracted from CSV field 4 to obtain temperature
pub const CSV_TEMPERATURE_OFFSET: f64 = 278.0;

/// Raw frame as delivered by a link, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// Bytes from a USB IN control transfer
    Binary(Vec<u8>),

    /// One newline-terminated line from the serial port
    Text(Vec<u8>),
}

impl RawFrame {
    /// Number of raw bytes carried
    pub fn len(&self) -> usize {
        match self {
            RawFrame::Binary(bytes) | RawFrame::Text(bytes) => bytes.len(),
        }
    }

    /// True when no bytes were received
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Payload clock reading.
///
/// Fields are passed through exactly as sent; seconds above 59 or a
/// microsecond count above one second are not normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub microseconds: u32,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:06}",
            self.hours, self.minutes, self.seconds, self.microseconds
        )
    }
}

/// Three-axis acceleration in g
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One fully decoded telemetry reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetrySample {
    /// Payload clock
    pub timestamp: Timestamp,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters
    pub altitude: i32,

    /// Temperature in °C
    pub temperature: f64,

    /// Pressure in millibar
    pub pressure: f64,

    /// Acceleration in g
    pub acceleration: Acceleration,
}

//! # Telemetry Frame Encoder
//!
//! Encodes samples back into the payload's wire formats. The ground station
//! never transmits frames; this is the inverse of the decoder, used to build
//! device-format frames for replay and testing.

use bytes::{BufMut, BytesMut};

use super::protocol::*;

/// Encode a sample into the 29-byte little-endian binary layout
///
/// Scaled fields are rounded to the nearest raw step and saturate at the
/// field width, so any sample produced by the binary decoder encodes back
/// to exactly the bytes it came from.
///
/// # Examples
///
/// ```
/// use rocket_telemetry::frame::decoder::decode_binary_frame;
/// use rocket_telemetry::frame::encoder::encode_binary_frame;
/// use rocket_telemetry::frame::protocol::TelemetrySample;
///
/// let frame = encode_binary_frame(&TelemetrySample::default());
/// assert_eq!(frame.len(), 29);
/// assert!(decode_binary_frame(&frame).is_ok());
/// ```
pub fn encode_binary_frame(sample: &TelemetrySample) -> Vec<u8> {
    let mut frame = BytesMut::with_capacity(BINARY_FRAME_LEN);

    frame.put_u8(sample.timestamp.hours);
    frame.put_u8(sample.timestamp.minutes);
    frame.put_u8(sample.timestamp.seconds);
    frame.put_u32_le(sample.timestamp.microseconds);

    frame.put_i32_le(quantize(sample.latitude, COORDINATE_SCALE) as i32);
    frame.put_i32_le(quantize(sample.longitude, COORDINATE_SCALE) as i32);
    frame.put_i32_le(sample.altitude);

    frame.put_u16_le(quantize(sample.temperature - TEMPERATURE_OFFSET, TEMPERATURE_SCALE) as u16);
    frame.put_u16_le(quantize(sample.pressure, PRESSURE_SCALE) as u16);

    frame.put_i16_le(quantize(sample.acceleration.x, ACCEL_SCALE) as i16);
    frame.put_i16_le(quantize(sample.acceleration.y, ACCEL_SCALE) as i16);
    frame.put_i16_le(quantize(sample.acceleration.z, ACCEL_SCALE) as i16);

    frame.to_vec()
}

/// Encode a sample as a CSV line in the serial field order
///
/// Field 0 and field 3 carry no data and are written as `0`. Timestamp and
/// altitude are not part of the CSV format and are dropped.
pub fn encode_text_frame(sample: &TelemetrySample) -> String {
    format!(
        "0,{},{},0,{},{},{},{},{}\n",
        sample.latitude,
        sample.longitude,
        sample.temperature + CSV_TEMPERATURE_OFFSET,
        sample.pressure,
        sample.acceleration.x,
        sample.acceleration.y,
        sample.acceleration.z,
    )
}

/// Scale a physical value to its raw step count.
///
/// Float-to-int `as` casts saturate, which gives the field-width clamp.
fn quantize(value: f64, scale: f64) -> f64 {
    (value * scale).round()
}

//! # Telemetry Frame Decoder
//!
//! Decodes raw frames into [`TelemetrySample`]s. Both decoders are total:
//! they either return a complete sample or reject the whole frame.

use bytes::Buf;

use super::protocol::*;
use crate::error::DecodeError;

/// Decode a raw frame with the decoder matching its wire format
pub fn decode_frame(frame: &RawFrame) -> Result<TelemetrySample, DecodeError> {
    match frame {
        RawFrame::Binary(bytes) => decode_binary_frame(bytes),
        RawFrame::Text(bytes) => decode_text_frame(bytes),
    }
}

/// Decode a little-endian binary frame from the USB link
///
/// # Arguments
///
/// * `frame` - Bytes from the IN transfer. Only the first 29 are used;
///   padding after them is ignored.
///
/// # Errors
///
/// Returns `FrameTooShort` if fewer than 29 bytes are supplied
pub fn decode_binary_frame(frame: &[u8]) -> Result<TelemetrySample, DecodeError> {
    if frame.len() < BINARY_FRAME_LEN {
        return Err(DecodeError::FrameTooShort {
            expected: BINARY_FRAME_LEN,
            actual: frame.len(),
        });
    }

    let timestamp = Timestamp {
        hours: frame[OFFSET_HOURS],
        minutes: frame[OFFSET_MINUTES],
        seconds: frame[OFFSET_SECONDS],
        microseconds: field(frame, OFFSET_MICROSECONDS).get_u32_le(),
    };

    let latitude = field(frame, OFFSET_LATITUDE).get_i32_le() as f64 / COORDINATE_SCALE;
    let longitude = field(frame, OFFSET_LONGITUDE).get_i32_le() as f64 / COORDINATE_SCALE;
    let altitude = field(frame, OFFSET_ALTITUDE).get_i32_le();

    let temperature =
        field(frame, OFFSET_TEMPERATURE).get_u16_le() as f64 / TEMPERATURE_SCALE + TEMPERATURE_OFFSET;
    let pressure = field(frame, OFFSET_PRESSURE).get_u16_le() as f64 / PRESSURE_SCALE;

    let acceleration = Acceleration {
        x: field(frame, OFFSET_ACCEL_X).get_i16_le() as f64 / ACCEL_SCALE,
        y: field(frame, OFFSET_ACCEL_Y).get_i16_le() as f64 / ACCEL_SCALE,
        z: field(frame, OFFSET_ACCEL_Z).get_i16_le() as f64 / ACCEL_SCALE,
    };

    Ok(TelemetrySample {
        timestamp,
        latitude,
        longitude,
        altitude,
        temperature,
        pressure,
        acceleration,
    })
}

/// Bytes of the frame starting at a field offset
fn field(frame: &[u8], offset: usize) -> &[u8] {
    &frame[offset..BINARY_FRAME_LEN]
}

/// Decode one comma-separated line from the serial link
///
/// # Arguments
///
/// * `line` - Raw line bytes, with or without the trailing newline
///
/// # Errors
///
/// Returns error if:
/// - Line is not UTF-8, or is empty after trimming
/// - Line has fewer than 9 fields
/// - Any decoded field is not a floating-point literal
pub fn decode_text_frame(line: &[u8]) -> Result<TelemetrySample, DecodeError> {
    let line = std::str::from_utf8(line).map_err(|_| DecodeError::InvalidUtf8)?;
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::EmptyLine);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < CSV_MIN_FIELDS {
        return Err(DecodeError::TooFewFields {
            expected: CSV_MIN_FIELDS,
            actual: fields.len(),
        });
    }

    let number = |index: usize| -> Result<f64, DecodeError> {
        let raw = fields[index].trim();
        raw.parse::<f64>().map_err(|_| DecodeError::InvalidField {
            index,
            value: raw.to_string(),
        })
    };

    // Every field is parsed before the sample is built
    let latitude = number(CSV_FIELD_LATITUDE)?;
    let longitude = number(CSV_FIELD_LONGITUDE)?;
    let temperature = number(CSV_FIELD_TEMPERATURE)? - CSV_TEMPERATURE_OFFSET;
    let pressure = number(CSV_FIELD_PRESSURE)?;
    let acceleration = Acceleration {
        x: number(CSV_FIELD_ACCEL_X)?,
        y: number(CSV_FIELD_ACCEL_Y)?,
        z: number(CSV_FIELD_ACCEL_Z)?,
    };

    Ok(TelemetrySample {
        timestamp: Timestamp::default(),
        latitude,
        longitude,
        altitude: 0,
        temperature,
        pressure,
        acceleration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encoder::encode_binary_frame;

    /// Build the reference frame byte by byte, independent of the encoder
    fn reference_frame() -> Vec<u8> {
        let mut frame = vec![1u8, 2, 3];
        frame.extend_from_slice(&0u32.to_le_bytes());
        frame.extend_from_slice(&40_000_000i32.to_le_bytes());
        frame.extend_from_slice(&(-96_000_000i32).to_le_bytes());
        frame.extend_from_slice(&500i32.to_le_bytes());
        frame.extend_from_slice(&150u16.to_le_bytes());
        frame.extend_from_slice(&10_000u16.to_le_bytes());
        frame.extend_from_slice(&20i16.to_le_bytes());
        frame.extend_from_slice(&(-20i16).to_le_bytes());
        frame.extend_from_slice(&0i16.to_le_bytes());
        frame
    }

    #[test]
    fn test_decode_reference_binary_frame() {
        let frame = reference_frame();
        assert_eq!(frame.len(), BINARY_FRAME_LEN);

        let sample = decode_binary_frame(&frame).unwrap();
        assert_eq!(
            sample.timestamp,
            Timestamp { hours: 1, minutes: 2, seconds: 3, microseconds: 0 }
        );
        assert!((sample.latitude - 40.0).abs() < 1e-9);
        assert!((sample.longitude - (-96.0)).abs() < 1e-9);
        assert_eq!(sample.altitude, 500);
        assert!((sample.temperature - 10.0).abs() < 1e-9);
        assert!((sample.pressure - 1000.0).abs() < 1e-9);
        assert_eq!(sample.acceleration, Acceleration { x: 1.0, y: -1.0, z: 0.0 });
    }

    #[test]
    fn test_decode_binary_ignores_transfer_padding() {
        let mut frame = reference_frame();
        frame.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(frame.len(), USB_TRANSFER_LEN);

        let padded = decode_binary_frame(&frame).unwrap();
        let exact = decode_binary_frame(&frame[..BINARY_FRAME_LEN]).unwrap();
        assert_eq!(padded, exact);
    }

    #[test]
    fn test_decode_binary_too_short() {
        let frame = reference_frame();
        for len in 0..BINARY_FRAME_LEN {
            let result = decode_binary_frame(&frame[..len]);
            assert_eq!(
                result,
                Err(DecodeError::FrameTooShort { expected: BINARY_FRAME_LEN, actual: len })
            );
        }
    }

    #[test]
    fn test_decode_binary_extremes() {
        let mut frame = vec![255u8, 255, 255];
        frame.extend_from_slice(&u32::MAX.to_le_bytes());
        frame.extend_from_slice(&i32::MIN.to_le_bytes());
        frame.extend_from_slice(&i32::MAX.to_le_bytes());
        frame.extend_from_slice(&i32::MIN.to_le_bytes());
        frame.extend_from_slice(&0u16.to_le_bytes());
        frame.extend_from_slice(&u16::MAX.to_le_bytes());
        frame.extend_from_slice(&i16::MIN.to_le_bytes());
        frame.extend_from_slice(&i16::MAX.to_le_bytes());
        frame.extend_from_slice(&(-1i16).to_le_bytes());

        let sample = decode_binary_frame(&frame).unwrap();
        assert_eq!(sample.timestamp.hours, 255);
        assert_eq!(sample.timestamp.microseconds, u32::MAX);
        assert!((sample.latitude - (-2147.483648)).abs() < 1e-9);
        assert!((sample.longitude - 2147.483647).abs() < 1e-9);
        assert_eq!(sample.altitude, i32::MIN);
        assert!((sample.temperature - (-5.0)).abs() < 1e-9);
        assert!((sample.pressure - 6553.5).abs() < 1e-9);
        assert!((sample.acceleration.x - (-1638.4)).abs() < 1e-9);
        assert!((sample.acceleration.y - 1638.35).abs() < 1e-9);
        assert!((sample.acceleration.z - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_binary_reencode_recovers_bytes() {
        let frame = reference_frame();
        let sample = decode_binary_frame(&frame).unwrap();
        assert_eq!(encode_binary_frame(&sample).as_slice(), frame.as_slice());

        // Arbitrary non-trivial bytes survive decode then encode
        let noisy: Vec<u8> = (0..BINARY_FRAME_LEN as u8).map(|b| b.wrapping_mul(37).wrapping_add(11)).collect();
        let sample = decode_binary_frame(&noisy).unwrap();
        assert_eq!(encode_binary_frame(&sample).as_slice(), noisy.as_slice());
    }

    #[test]
    fn test_decode_reference_text_frame() {
        let sample = decode_text_frame(b"0,40.1,-96.2,ignored,288.0,1013.0,0.1,-0.2,0.3\r\n").unwrap();
        assert!((sample.latitude - 40.1).abs() < 1e-9);
        assert!((sample.longitude - (-96.2)).abs() < 1e-9);
        assert!((sample.temperature - 10.0).abs() < 1e-9);
        assert!((sample.pressure - 1013.0).abs() < 1e-9);
        assert!((sample.acceleration.x - 0.1).abs() < 1e-9);
        assert!((sample.acceleration.y - (-0.2)).abs() < 1e-9);
        assert!((sample.acceleration.z - 0.3).abs() < 1e-9);
        assert_eq!(sample.timestamp, Timestamp::default());
        assert_eq!(sample.altitude, 0);
    }

    #[test]
    fn test_decode_text_accepts_extra_fields() {
        let sample = decode_text_frame(b"0,1,2,3,278,5,6,7,8,9,10").unwrap();
        assert_eq!(sample.latitude, 1.0);
        assert_eq!(sample.temperature, 0.0);
        assert_eq!(sample.acceleration.z, 8.0);
    }

    #[test]
    fn test_decode_text_empty_lines() {
        assert_eq!(decode_text_frame(b""), Err(DecodeError::EmptyLine));
        assert_eq!(decode_text_frame(b"\n"), Err(DecodeError::EmptyLine));
        assert_eq!(decode_text_frame(b"  \r\n"), Err(DecodeError::EmptyLine));
    }

    #[test]
    fn test_decode_text_too_few_fields() {
        for line in ["0", "0,1,2,3,4,5,6,7", "0,40.1,-96.2,,288.0,1013.0,0.1,-0.2"] {
            let result = decode_text_frame(line.as_bytes());
            assert!(
                matches!(result, Err(DecodeError::TooFewFields { expected: CSV_MIN_FIELDS, .. })),
                "line {:?} gave {:?}",
                line,
                result
            );
        }
    }

    #[test]
    fn test_decode_text_non_numeric_field() {
        let result = decode_text_frame(b"0,40.1,-96.2,x,288.0,1013.0,0.1,oops,0.3");
        assert_eq!(
            result,
            Err(DecodeError::InvalidField { index: 7, value: "oops".to_string() })
        );

        let result = decode_text_frame(b"0,,-96.2,x,288.0,1013.0,0.1,0.2,0.3");
        assert!(matches!(result, Err(DecodeError::InvalidField { index: 1, .. })));
    }

    #[test]
    fn test_decode_text_invalid_utf8() {
        let result = decode_text_frame(&[0x30, 0x2C, 0xFF, 0xFE]);
        assert_eq!(result, Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_decode_frame_dispatches_on_format() {
        let binary = decode_frame(&RawFrame::Binary(reference_frame())).unwrap();
        assert_eq!(binary.altitude, 500);

        let text = decode_frame(&RawFrame::Text(b"0,1,2,3,278,5,6,7,8\n".to_vec())).unwrap();
        assert_eq!(text.pressure, 5.0);

        // Same bytes through the wrong decoder are rejected, not misread
        let wrong = decode_frame(&RawFrame::Binary(b"0,1,2,3,278,5,6,7,8\n".to_vec()));
        assert!(wrong.is_err());
    }
}

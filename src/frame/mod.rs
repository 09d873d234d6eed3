//! # Telemetry Frame Module
//!
//! Wire formats of the rocket payload's telemetry frames.
//!
//! This module handles:
//! - Binary frame layout (29 bytes, little-endian, fixed-point fields)
//! - CSV line layout from the serial receiver
//! - Decoding either format into a `TelemetrySample`
//! - Re-encoding samples for replay and testing

pub mod protocol;
pub mod encoder;
pub mod decoder;

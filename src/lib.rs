//! # Rocket Telemetry Library
//!
//! Ground-station ingestion for a rocket payload's telemetry stream.
//!
//! This library provides the core pipeline: acquiring raw frames from the
//! payload receiver over USB vendor control transfers or a serial line,
//! decoding them into samples, and keeping the latest sample plus bounded
//! history windows for live plotting.

pub mod config;
pub mod error;
pub mod frame;
pub mod link;
pub mod store;
pub mod poll;
pub mod display;

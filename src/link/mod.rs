//! # Link Module
//!
//! Transports that deliver raw telemetry frames from the payload receiver.
//!
//! This module handles:
//! - USB vendor control-transfer exchange (arm, wait, read 32 bytes)
//! - Serial line acquisition at 115,200 baud (flush input, read one line)
//! - Selecting the transport at startup from configuration
//!
//! Every failure is returned as a [`LinkError`]; nothing panics past
//! this boundary.

pub mod serial;
pub mod usb;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, LinkKind};
use crate::error::{self, LinkError};
use crate::frame::protocol::RawFrame;

/// Source of raw telemetry frames
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Link: Send {
    /// Acquire one raw frame
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout or an incomplete read
    async fn acquire(&mut self) -> Result<RawFrame, LinkError>;

    /// Human-readable description for logs (device id or port path)
    fn describe(&self) -> String;
}

/// Open the link selected by configuration
///
/// # Errors
///
/// Returns [`TelemetryError::Link`](crate::error::TelemetryError::Link) with a
/// fatal [`LinkError`] if the device or port is not available
pub fn open_link(config: &Config) -> error::Result<Box<dyn Link>> {
    let link: Box<dyn Link> = match config.link.kind {
        LinkKind::Usb => Box::new(usb::UsbLink::open(&config.usb)?),
        LinkKind::Serial => Box::new(serial::SerialLink::open(&config.serial)?),
    };
    info!("Telemetry link ready: {}", link.describe());
    Ok(link)
}

//! # USB Vendor-Transfer Link
//!
//! Acquires binary frames from the payload receiver with a two-step vendor
//! control exchange:
//!
//! 1. OUT transfer, request 100 ("arm a read"), no data
//! 2. Fixed delay while the receiver prepares its response
//! 3. IN transfer, request 200, 32 bytes (29 meaningful)
//!
//! Both transfers are addressed to the vendor interface recipient with
//! value 1 and index 0. The exchange blocks, so it runs on tokio's blocking
//! pool rather than on a runtime worker.

use async_trait::async_trait;
use rusb::{DeviceHandle, GlobalContext, UsbContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::Link;
use crate::config::UsbConfig;
use crate::error::LinkError;
use crate::frame::protocol::{RawFrame, USB_TRANSFER_LEN};

/// Request type for host-to-device vendor requests to an interface (0x41)
pub const OUT_VENDOR_INTERFACE: u8 = (0 << 7) | (2 << 5) | 1;

/// Request type for device-to-host vendor requests to an interface (0xC1)
pub const IN_VENDOR_INTERFACE: u8 = (1 << 7) | (2 << 5) | 1;

/// Vendor request that arms the receiver to produce a frame
pub const ARM_REQUEST: u8 = 100;

/// Vendor request that reads the prepared frame
pub const READ_REQUEST: u8 = 200;

/// wValue / wIndex used by both requests
pub const REQUEST_VALUE: u16 = 1;
pub const REQUEST_INDEX: u16 = 0;

/// Control-transfer seam over a USB device handle
pub trait ControlTransport: Send + Sync {
    /// Host-to-device control transfer
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;

    /// Device-to-host control transfer into `buf`
    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;
}

impl<T: UsbContext> ControlTransport for DeviceHandle<T> {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::write_control(self, request_type, request, value, index, data, timeout)
    }

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::read_control(self, request_type, request, value, index, buf, timeout)
    }
}

/// USB vendor-transfer link
pub struct UsbLink<T: ControlTransport> {
    transport: Arc<T>,
    response_delay: Duration,
    transfer_timeout: Duration,
    description: String,
}

impl<T: ControlTransport> std::fmt::Debug for UsbLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbLink")
            .field("description", &self.description)
            .field("response_delay", &self.response_delay)
            .finish_non_exhaustive()
    }
}

impl UsbLink<DeviceHandle<GlobalContext>> {
    /// Open the receiver by vendor/product id and select its configuration
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if no matching device is attached, or `Usb`
    /// if the configuration cannot be set
    pub fn open(config: &UsbConfig) -> Result<Self, LinkError> {
        let handle = rusb::open_device_with_vid_pid(config.vendor_id, config.product_id)
            .ok_or(LinkError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            })?;

        let configuration = handle.device().config_descriptor(0)?.number();
        handle.set_active_configuration(configuration)?;

        info!(
            "Opened USB receiver {:04x}:{:04x} (configuration {})",
            config.vendor_id, config.product_id, configuration
        );

        Ok(Self::new(
            handle,
            Duration::from_millis(config.response_delay_ms),
            Duration::from_millis(config.transfer_timeout_ms),
        )
        .with_description(format!("usb {:04x}:{:04x}", config.vendor_id, config.product_id)))
    }
}

impl<T: ControlTransport> UsbLink<T> {
    /// Wrap an already-open transport
    pub fn new(transport: T, response_delay: Duration, transfer_timeout: Duration) -> Self {
        Self {
            transport: Arc::new(transport),
            response_delay,
            transfer_timeout,
            description: "usb".to_string(),
        }
    }

    fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }
}

/// Run one arm/wait/read exchange, returning the bytes actually received
fn exchange<T: ControlTransport + ?Sized>(
    transport: &T,
    response_delay: Duration,
    timeout: Duration,
) -> Result<Vec<u8>, LinkError> {
    transport.write_control(
        OUT_VENDOR_INTERFACE,
        ARM_REQUEST,
        REQUEST_VALUE,
        REQUEST_INDEX,
        &[],
        timeout,
    )?;

    std::thread::sleep(response_delay);

    let mut buf = vec![0u8; USB_TRANSFER_LEN];
    let received = transport.read_control(
        IN_VENDOR_INTERFACE,
        READ_REQUEST,
        REQUEST_VALUE,
        REQUEST_INDEX,
        &mut buf,
        timeout,
    )?;
    buf.truncate(received);

    Ok(buf)
}

#[async_trait]
impl<T: ControlTransport + 'static> Link for UsbLink<T> {
    async fn acquire(&mut self) -> Result<RawFrame, LinkError> {
        let transport = Arc::clone(&self.transport);
        let (delay, timeout) = (self.response_delay, self.transfer_timeout);

        let bytes = tokio::task::spawn_blocking(move || exchange(&*transport, delay, timeout))
            .await
            .map_err(|e| LinkError::Worker(e.to_string()))??;

        debug!("Received USB frame ({} bytes)", bytes.len());
        Ok(RawFrame::Binary(bytes))
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

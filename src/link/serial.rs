//! # Serial-Line Link
//!
//! Acquires CSV frames from a receiver that prints one line per reading.
//!
//! Each acquisition discards whatever is already buffered on the port and
//! then waits for the next complete line, so the loop always decodes the
//! freshest reading instead of working through a backlog.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tracing::{debug, info};

use super::Link;
use crate::config::SerialConfig;
use crate::error::LinkError;
use crate::frame::protocol::RawFrame;

/// Receiver baud rate (fixed by its firmware)
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Line-oriented serial port operations
#[async_trait]
pub trait LineIo: Send {
    /// Discard bytes already received but not yet read
    fn clear_input(&mut self) -> io::Result<()>;

    /// Read up to and including the next `\n`, appending to `buf`
    ///
    /// Returns the number of bytes read; 0 means end of stream.
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
}

/// Wrapper around tokio_serial::SerialStream that implements LineIo
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl LineIo for TokioSerialPort {
    fn clear_input(&mut self) -> io::Result<()> {
        self.port
            .clear(tokio_serial::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    async fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        // Bytes buffered past the newline are dropped with the reader; the
        // next acquisition clears input anyway.
        let mut reader = BufReader::new(&mut self.port);
        reader.read_until(b'\n', buf).await
    }
}

/// Serial-line link
pub struct SerialLink<P: LineIo> {
    port: P,
    port_name: String,
    read_timeout: Duration,
}

impl<P: LineIo> std::fmt::Debug for SerialLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("port_name", &self.port_name)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl SerialLink<TokioSerialPort> {
    /// Open the configured port at 115,200 baud, 8N1
    ///
    /// # Errors
    ///
    /// Returns `SerialOpen` if the port does not exist or cannot be opened
    pub fn open(config: &SerialConfig) -> Result<Self, LinkError> {
        let port = tokio_serial::new(&config.port, SERIAL_BAUD_RATE)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| LinkError::SerialOpen {
                port: config.port.clone(),
                reason: e.to_string(),
            })?;

        info!("Serial port open: {} at {} baud", config.port, SERIAL_BAUD_RATE);

        Ok(Self::new(
            TokioSerialPort::new(port),
            config.port.clone(),
            Duration::from_millis(config.timeout_ms),
        ))
    }
}

impl<P: LineIo> SerialLink<P> {
    /// Wrap an already-open port
    pub fn new(port: P, port_name: String, read_timeout: Duration) -> Self {
        Self {
            port,
            port_name,
            read_timeout,
        }
    }

    /// Get the device path of the opened serial port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl<P: LineIo> Link for SerialLink<P> {
    async fn acquire(&mut self) -> Result<RawFrame, LinkError> {
        self.port.clear_input()?;

        let mut line = Vec::new();
        let read = tokio::time::timeout(self.read_timeout, self.port.read_line(&mut line))
            .await
            .map_err(|_| LinkError::Timeout(self.read_timeout))??;

        if read == 0 || line.last() != Some(&b'\n') {
            return Err(LinkError::ShortRead { received: line.len() });
        }

        debug!("Received serial line ({} bytes)", line.len());
        Ok(RawFrame::Text(line))
    }

    fn describe(&self) -> String {
        format!("serial {}", self.port_name)
    }
}

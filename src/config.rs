//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{Result, TelemetryError};

/// Environment variable that overrides `serial.port`
pub const SERIAL_PORT_ENV: &str = "SERIAL_PORT";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub usb: UsbConfig,
    pub serial: SerialConfig,
    pub poll: PollConfig,
    pub logging: LoggingConfig,
}

/// Which transport to acquire frames over
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    #[default]
    Usb,
    Serial,
}

/// Link selection
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LinkConfig {
    pub kind: LinkKind,
}

/// USB vendor-transfer link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UsbConfig {
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    #[serde(default = "default_product_id")]
    pub product_id: u16,

    #[serde(default = "default_response_delay_ms")]
    pub response_delay_ms: u64,

    #[serde(default = "default_transfer_timeout_ms")]
    pub transfer_timeout_ms: u64,
}

/// Serial-line link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_serial_timeout_ms")]
    pub timeout_ms: u64,
}

/// Poll loop timing
#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_acquire_interval_ms")]
    pub acquire_interval_ms: u64,

    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    #[serde(default = "default_status_interval_cycles")]
    pub status_interval_cycles: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to a daily rolling file in this directory
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_vendor_id() -> u16 { 0x5e1f }
fn default_product_id() -> u16 { 0x1e55 }
fn default_response_delay_ms() -> u64 { 100 }
fn default_transfer_timeout_ms() -> u64 { 1000 }

fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_serial_timeout_ms() -> u64 { 10_000 }

fn default_acquire_interval_ms() -> u64 { 200 }
fn default_position_interval_ms() -> u64 { 1000 }
fn default_status_interval_cycles() -> u64 { 300 }

fn default_log_level() -> String { "info".to_string() }

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            response_delay_ms: default_response_delay_ms(),
            transfer_timeout_ms: default_transfer_timeout_ms(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            timeout_ms: default_serial_timeout_ms(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            acquire_interval_ms: default_acquire_interval_ms(),
            position_interval_ms: default_position_interval_ms(),
            status_interval_cycles: default_status_interval_cycles(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rocket_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a file if it exists, otherwise fall back to defaults
    ///
    /// The `SERIAL_PORT` environment variable is applied in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };
        config.apply_env_overrides(std::env::var(SERIAL_PORT_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a serial port name taken from the environment
    pub fn apply_env_overrides(&mut self, serial_port: Option<String>) {
        if let Some(port) = serial_port.filter(|port| !port.trim().is_empty()) {
            self.serial.port = port;
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.link.kind == LinkKind::Serial && self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 60_000 {
            return Err(invalid("serial timeout_ms must be between 1 and 60000"));
        }

        if self.usb.response_delay_ms > 1000 {
            return Err(invalid("usb response_delay_ms must be between 0 and 1000"));
        }

        if self.usb.transfer_timeout_ms == 0 || self.usb.transfer_timeout_ms > 10_000 {
            return Err(invalid("usb transfer_timeout_ms must be between 1 and 10000"));
        }

        for (name, value) in [
            ("acquire_interval_ms", self.poll.acquire_interval_ms),
            ("position_interval_ms", self.poll.position_interval_ms),
        ] {
            if value == 0 || value > 60_000 {
                return Err(invalid(format!("{} must be between 1 and 60000", name)));
            }
        }

        if self.poll.status_interval_cycles == 0 {
            return Err(invalid("status_interval_cycles must be greater than 0"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        if matches!(&self.logging.directory, Some(dir) if dir.is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.link.kind, LinkKind::Usb);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_vendor_id(), 0x5e1f);
        assert_eq!(default_product_id(), 0x1e55);
        assert_eq!(default_response_delay_ms(), 100);
        assert_eq!(default_transfer_timeout_ms(), 1000);
        assert_eq!(default_serial_port(), "/dev/ttyACM0");
        assert_eq!(default_serial_timeout_ms(), 10_000);
        assert_eq!(default_acquire_interval_ms(), 200);
        assert_eq!(default_position_interval_ms(), 1000);
        assert_eq!(default_status_interval_cycles(), 300);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.link.kind, LinkKind::Usb);
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.poll.acquire_interval_ms, 200);
    }

    #[test]
    fn test_parse_serial_config() {
        let config = Config::from_toml(
            r#"
[link]
kind = "serial"

[serial]
port = "/dev/ttyUSB1"
timeout_ms = 5000

[poll]
acquire_interval_ms = 500
"#,
        )
        .unwrap();

        assert_eq!(config.link.kind, LinkKind::Serial);
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.timeout_ms, 5000);
        assert_eq!(config.poll.acquire_interval_ms, 500);
        assert_eq!(config.poll.position_interval_ms, 1000);
    }

    #[test]
    fn test_unknown_link_kind() {
        let result = Config::from_toml("[link]\nkind = \"bluetooth\"\n");
        assert!(matches!(result, Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[link]
kind = "usb"

[usb]
vendor_id = 0x1234
product_id = 0x5678
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.usb.vendor_id, 0x1234);
        assert_eq!(config.usb.product_id, 0x5678);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Config::load("/nonexistent/rocket-telemetry.toml");
        assert!(matches!(result, Err(TelemetryError::Io(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/rocket-telemetry.toml").unwrap();
        assert_eq!(config.usb.vendor_id, 0x5e1f);
    }

    #[test]
    fn test_env_override_serial_port() {
        let mut config = Config::default();
        config.apply_env_overrides(Some("/dev/ttyUSB3".to_string()));
        assert_eq!(config.serial.port, "/dev/ttyUSB3");

        config.apply_env_overrides(Some("  ".to_string()));
        assert_eq!(config.serial.port, "/dev/ttyUSB3");

        config.apply_env_overrides(None);
        assert_eq!(config.serial.port, "/dev/ttyUSB3");
    }

    #[test]
    fn test_empty_serial_port_when_serial() {
        let mut config = Config::default();
        config.link.kind = LinkKind::Serial;
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_serial_port_when_usb() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serial_timeout_bounds() {
        let mut config = Config::default();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 60_001;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 60_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_response_delay_too_high() {
        let mut config = Config::default();
        config.usb.response_delay_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_response_delay_zero_allowed() {
        let mut config = Config::default();
        config.usb.response_delay_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transfer_timeout_zero() {
        let mut config = Config::default();
        config.usb.transfer_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_acquire_interval_zero() {
        let mut config = Config::default();
        config.poll.acquire_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_position_interval_too_high() {
        let mut config = Config::default();
        config.poll.position_interval_ms = 60_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_interval_zero() {
        let mut config = Config::default();
        config.poll.status_interval_cycles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_directory() {
        let mut config = Config::default();
        config.logging.directory = Some(String::new());
        assert!(config.validate().is_err());
    }
}

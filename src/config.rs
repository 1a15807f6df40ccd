//! # Slave Configuration
//!
//! Station address, transport limits and panel timing for one device.
//!
//! # Example
//!
//! ```rust
//! use voltage_modbus_slave::SlaveConfig;
//!
//! let config = SlaveConfig::new()
//!     .with_unit_id(3)
//!     .with_bind_address("127.0.0.1:1502");
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.unit_id, 3);
//! ```

use std::time::Duration;

use crate::constants::{
    DEFAULT_BUTTON_POLL_MS, DEFAULT_DISPLAY_REFRESH_MS, DEFAULT_TCP_PORT, DEFAULT_UNIT_ID,
    EXCEPTION_FRAME_LEN, MAX_FRAME_LEN,
};
use crate::error::{ModbusError, ModbusResult};
use crate::register_bank::InitialFill;

/// Device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveConfig {
    /// Station address this device answers to (1-247)
    pub unit_id: u8,
    /// TCP listen address
    pub bind_address: String,
    /// Bytes the transport can accept for a single reply
    pub send_capacity: usize,
    /// Button sampling period
    pub button_poll_interval: Duration,
    /// Display refresh period
    pub display_refresh_interval: Duration,
    /// Register content at start-up
    pub initial_fill: InitialFill,
}

impl SlaveConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the station address
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Set the TCP listen address
    pub fn with_bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = addr.into();
        self
    }

    /// Set the reply size limit
    pub fn with_send_capacity(mut self, bytes: usize) -> Self {
        self.send_capacity = bytes;
        self
    }

    /// Set the button sampling period
    pub fn with_button_poll_interval(mut self, interval: Duration) -> Self {
        self.button_poll_interval = interval;
        self
    }

    /// Set the display refresh period
    pub fn with_display_refresh_interval(mut self, interval: Duration) -> Self {
        self.display_refresh_interval = interval;
        self
    }

    /// Set the register content at start-up
    pub fn with_initial_fill(mut self, fill: InitialFill) -> Self {
        self.initial_fill = fill;
        self
    }

    /// Reject configurations the device cannot run with
    pub fn validate(&self) -> ModbusResult<()> {
        if self.unit_id == 0 {
            return Err(ModbusError::config("unit id 0 is broadcast, which is not supported"));
        }
        if self.send_capacity < EXCEPTION_FRAME_LEN {
            return Err(ModbusError::config(format!(
                "send capacity {} is below the smallest reply ({} bytes)",
                self.send_capacity, EXCEPTION_FRAME_LEN
            )));
        }
        if self.button_poll_interval.is_zero() || self.display_refresh_interval.is_zero() {
            return Err(ModbusError::config("panel intervals must be non-zero"));
        }
        Ok(())
    }
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            unit_id: DEFAULT_UNIT_ID,
            bind_address: format!("0.0.0.0:{}", DEFAULT_TCP_PORT),
            send_capacity: MAX_FRAME_LEN,
            button_poll_interval: Duration::from_millis(DEFAULT_BUTTON_POLL_MS),
            display_refresh_interval: Duration::from_millis(DEFAULT_DISPLAY_REFRESH_MS),
            initial_fill: InitialFill::Zero,
        }
    }
}

//! Error types for the slave
//!
//! Protocol-level outcomes (exception replies, dropped frames) are plain
//! values, see [`crate::exception::ExceptionCode`] and
//! [`crate::frame::FrameRejection`]. `ModbusError` covers everything that
//! is a genuine failure: I/O, configuration and buffer misuse.

use thiserror::Error;

/// Result alias used across the crate
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Errors raised by the slave and its transport adapters
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Underlying socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed data or buffer overflow
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Function code not handled here
    #[error("Invalid function code: 0x{code:02X}")]
    InvalidFunction { code: u8 },

    /// Logical address outside the register bank
    #[error("Invalid register address: 0x{address:04X}")]
    InvalidAddress { address: u16 },

    /// Register value above the ceiling
    #[error("Invalid register value: {value}")]
    InvalidValue { value: u16 },

    /// Rejected configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport refused or failed to carry a frame
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl ModbusError {
    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

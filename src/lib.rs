//! # Voltage Modbus Slave - Register Panel Device
//!
//! **Author:** Evan Liu <liuyifanz.1996@gmail.com>
//! **License:** MIT
//!
//! A Modbus TCP slave exposing a small bank of holding registers, with a
//! two-register panel display driven by push buttons.
//!
//! ## Features
//!
//! - **Robust Frame Handling**: malformed or foreign frames are dropped, never panic
//! - **All-or-Nothing Writes**: a rejected request leaves the bank untouched
//! - **Shared Register Bank**: one lock guards network writes and display reads
//! - **Async Transport**: Tokio TCP server and panel timers (`server` feature)
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Slave |
//! |------|----------|-------|
//! | 0x10 | Write Multiple Registers | ✅ |
//! | other | - | Exception 0x01 |
//!
//! ## Register Layout
//!
//! | Address | Slot | Range |
//! |---------|------|-------|
//! | 0x0010-0x0017 | 0-7 | 0-1023 |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use voltage_modbus_slave::{ModbusSlave, PduBuilder, RegisterBank};
//!
//! let slave = ModbusSlave::new(1, Arc::new(RegisterBank::new()));
//!
//! // MBAP header (txn 1, unit 1) + FC16 writing [5, 900] at 0x0010
//! let pdu = PduBuilder::build_write_multiple_registers(0x0010, &[5, 900]).unwrap();
//! let mut frame = vec![0x00, 0x01, 0x00, 0x00, 0x00, pdu.len() as u8 + 1, 0x01];
//! frame.extend_from_slice(pdu.as_slice());
//!
//! let reply = slave.process(&frame).unwrap();
//! assert_eq!(&reply[7..], &[0x10, 0x00, 0x10, 0x00, 0x02]);
//! assert_eq!(slave.bank().read(0x0011).unwrap(), 900);
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Modbus protocol and register layout constants
pub mod constants;

/// Exception codes returned by the slave
pub mod exception;

/// Stack-allocated PDU and builders
pub mod pdu;

/// Shared, lock-guarded register storage
pub mod register_bank;

/// MBAP header parsing and frame validation
pub mod frame;

/// Write Multiple Registers handler
pub mod handler;

/// Function code dispatch
pub mod dispatcher;

/// Reply frame assembly
pub mod response;

/// Protocol engine and transport callback contract
pub mod slave;

/// Device configuration
pub mod config;

// ============================================================================
// Panel modules
// ============================================================================

/// Button debouncing
pub mod button;

/// Display selection and rendering
pub mod display;

/// Tokio TCP transport and panel timers
#[cfg(feature = "server")]
pub mod server;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime ===
#[cfg(feature = "server")]
pub use tokio;

// === Engine ===
pub use slave::{BufferSink, FrameDisposition, FrameSink, ModbusSlave, SlaveStats};

// === Error handling ===
pub use error::{ModbusError, ModbusResult};

// === Core types ===
pub use config::SlaveConfig;
pub use dispatcher::{CommandDispatcher, ModbusFunction};
pub use exception::ExceptionCode;
pub use frame::{validate_frame, FrameRejection, MbapHeader, RequestFrame};
pub use handler::{WriteMultipleRegistersHandler, WriteMultipleRequest};
pub use register_bank::{InitialFill, RegisterBank};
pub use response::{FrameOutcome, ResponseBuilder};

// === Panel ===
pub use button::{ButtonDebouncer, ButtonSource};
pub use display::{led_mask, DisplayRenderer, DisplaySelection, DisplaySelectionPresenter};

// === Transport ===
#[cfg(feature = "server")]
pub use server::{serve_connection, PanelLoop, TcpSlaveServer};

// === Protocol limits ===
pub use constants::{
    DEFAULT_TCP_PORT, MAX_REGISTER_VALUE, REGISTER_BASE_ADDRESS, REGISTER_COUNT,
};

// === PDU (advanced usage) ===
pub use pdu::{ModbusPdu, PduBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!(
        "Voltage Modbus Slave v{} - register panel device by Evan Liu",
        VERSION
    )
}

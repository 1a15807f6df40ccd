//! Modbus protocol and device constants
//!
//! Frame limits follow the Modbus TCP specification; the register layout
//! is specific to this device:
//! - 8 holding registers at logical addresses 0x0010..=0x0017
//! - every register value limited to 0..=1023

// ============================================================================
// Frame Size Constants
// ============================================================================

/// MBAP prefix that precedes the length-counted part of a frame.
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2) = 6 bytes
/// Note: the unit id is counted by the length field, so it is not included here
pub const MBAP_HEADER_LEN: usize = 6;

/// Smallest frame the slave will look at: MBAP prefix + unit id + function code
pub const MIN_FRAME_LEN: usize = MBAP_HEADER_LEN + 2;

/// Maximum PDU (Protocol Data Unit) size per Modbus specification
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum MBAP length field value (Unit ID + PDU)
/// = 1 (Unit ID) + 253 (Max PDU) = 254 bytes
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// Largest complete TCP frame: 6 + 254 = 260 bytes
pub const MAX_FRAME_LEN: usize = MBAP_HEADER_LEN + MAX_MBAP_LENGTH;

/// Smallest reply the slave ever sends: MBAP prefix + unit id + FC + exception code
pub const EXCEPTION_FRAME_LEN: usize = MBAP_HEADER_LEN + 3;

/// Protocol identifier carried by every Modbus TCP frame
pub const MODBUS_PROTOCOL_ID: u16 = 0x0000;

// ============================================================================
// Function Codes
// ============================================================================

/// Write Multiple Registers (FC16), the only function this slave implements
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// High bit set on the function code of an exception reply
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Fixed part of an FC16 request after the function code:
/// Starting Address(2) + Quantity(2) + Byte Count(1)
pub const WRITE_MULTIPLE_HEADER_LEN: usize = 5;

// ============================================================================
// Exception Codes
// ============================================================================

/// Function code not supported by this slave
pub const EXCEPTION_UNSUPPORTED_FUNCTION: u8 = 0x01;

/// Register address outside the bank
pub const EXCEPTION_INVALID_ADDRESS: u8 = 0x02;

/// Register count / byte count pairing rejected
pub const EXCEPTION_INVALID_REGISTER_DATA: u8 = 0x03;

/// Register value above the ceiling
pub const EXCEPTION_INVALID_REGISTER_VALUE: u8 = 0x04;

// ============================================================================
// Register Bank Layout
// ============================================================================

/// Logical address of slot 0
pub const REGISTER_BASE_ADDRESS: u16 = 0x0010;

/// Number of holding registers in the bank
pub const REGISTER_COUNT: usize = 8;

/// Largest value a register may hold
pub const MAX_REGISTER_VALUE: u16 = 1023;

/// First logical address past the bank (0x0018)
pub const REGISTER_END_ADDRESS: u16 = REGISTER_BASE_ADDRESS + REGISTER_COUNT as u16;

// ============================================================================
// Device Defaults
// ============================================================================

/// Station address used when none is configured
pub const DEFAULT_UNIT_ID: u8 = 1;

/// Modbus TCP default port
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Interval between two button readings (milliseconds)
pub const DEFAULT_BUTTON_POLL_MS: u64 = 100;

/// Interval between two display refreshes (milliseconds)
pub const DEFAULT_DISPLAY_REFRESH_MS: u64 = 1000;

//! Modbus exception codes returned by this slave

use std::fmt;

use crate::constants::{
    EXCEPTION_INVALID_ADDRESS, EXCEPTION_INVALID_REGISTER_DATA, EXCEPTION_INVALID_REGISTER_VALUE,
    EXCEPTION_UNSUPPORTED_FUNCTION,
};

/// Reason code sent instead of a normal payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExceptionCode {
    /// Function code is not implemented
    UnsupportedFunction = EXCEPTION_UNSUPPORTED_FUNCTION,
    /// Start address or address range outside the bank
    InvalidAddress = EXCEPTION_INVALID_ADDRESS,
    /// Register count or byte count rejected
    InvalidRegisterData = EXCEPTION_INVALID_REGISTER_DATA,
    /// A value exceeds the register ceiling
    InvalidRegisterValue = EXCEPTION_INVALID_REGISTER_VALUE,
}

impl ExceptionCode {
    /// Wire value
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire value. Codes this slave never emits return `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            EXCEPTION_UNSUPPORTED_FUNCTION => Some(Self::UnsupportedFunction),
            EXCEPTION_INVALID_ADDRESS => Some(Self::InvalidAddress),
            EXCEPTION_INVALID_REGISTER_DATA => Some(Self::InvalidRegisterData),
            EXCEPTION_INVALID_REGISTER_VALUE => Some(Self::InvalidRegisterValue),
            _ => None,
        }
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::UnsupportedFunction => "Unsupported Function",
            Self::InvalidAddress => "Invalid Address",
            Self::InvalidRegisterData => "Invalid Register Data",
            Self::InvalidRegisterValue => "Invalid Register Value",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.code())
    }
}

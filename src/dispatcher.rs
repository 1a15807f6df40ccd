//! Function code dispatch
//!
//! Each validated frame is routed exactly once, synchronously. Anything
//! but FC16 is answered with `UnsupportedFunction`.

use tracing::debug;

use crate::constants::FC_WRITE_MULTIPLE_REGISTERS;
use crate::exception::ExceptionCode;
use crate::frame::RequestFrame;
use crate::handler::WriteMultipleRegistersHandler;
use crate::pdu::ModbusPdu;
use crate::register_bank::RegisterBank;
use crate::response::FrameOutcome;

/// Functions this slave implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModbusFunction {
    WriteMultipleRegisters,
}

impl ModbusFunction {
    /// Look up a function code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            FC_WRITE_MULTIPLE_REGISTERS => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// Wire value
    pub fn code(self) -> u8 {
        match self {
            Self::WriteMultipleRegisters => FC_WRITE_MULTIPLE_REGISTERS,
        }
    }
}

/// Routes requests to their handler
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDispatcher {
    write_multiple: WriteMultipleRegistersHandler,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a validated frame against `bank`
    pub fn dispatch(&self, frame: &RequestFrame, bank: &RegisterBank) -> FrameOutcome {
        let fc = frame.function_code();
        match ModbusFunction::from_code(fc) {
            Some(ModbusFunction::WriteMultipleRegisters) => {
                self.write_multiple.handle(frame.pdu.body(), bank)
            }
            None => {
                debug!(
                    "Unsupported function: FC={:02X} ({})",
                    fc,
                    ModbusPdu::function_code_description(fc)
                );
                FrameOutcome::Exception(ExceptionCode::UnsupportedFunction)
            }
        }
    }
}

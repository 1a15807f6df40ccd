//! Write Multiple Registers (FC16) handler
//!
//! Request body after the function code:
//!
//! ```text
//! [start_addr:2][count:2][byte_count:1][value:2]*count
//! ```
//!
//! Checks run in a fixed order and map to fixed exception codes:
//!
//! | # | Check | Exception |
//! |---|-------|-----------|
//! | 1 | `1 <= count <= 8` | 0x03 |
//! | 2 | `byte_count == 2 * count` and the values are all present | 0x03 |
//! | 3 | start address inside the bank | 0x02 |
//! | 4 | `start + count <= 0x0018` | 0x02 |
//! | 5 | every value `<= 1023` | 0x04 |
//!
//! The bank is only touched after all five pass.

use tracing::debug;

use crate::constants::{
    FC_WRITE_MULTIPLE_REGISTERS, MAX_REGISTER_VALUE, REGISTER_COUNT, REGISTER_END_ADDRESS,
    WRITE_MULTIPLE_HEADER_LEN,
};
use crate::exception::ExceptionCode;
use crate::pdu::PduBuilder;
use crate::register_bank::RegisterBank;
use crate::response::FrameOutcome;

/// Decoded and fully validated FC16 request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMultipleRequest {
    pub start_address: u16,
    pub count: u16,
    values: [u16; REGISTER_COUNT],
}

impl WriteMultipleRequest {
    /// Decode and validate an FC16 body against the bank layout
    pub fn parse(body: &[u8]) -> Result<Self, ExceptionCode> {
        if body.len() < WRITE_MULTIPLE_HEADER_LEN {
            return Err(ExceptionCode::InvalidRegisterData);
        }
        let start_address = u16::from_be_bytes([body[0], body[1]]);
        let count = u16::from_be_bytes([body[2], body[3]]);
        let byte_count = body[4] as usize;

        if count == 0 || count as usize > REGISTER_COUNT {
            return Err(ExceptionCode::InvalidRegisterData);
        }

        let values_raw = &body[WRITE_MULTIPLE_HEADER_LEN..];
        if byte_count != 2 * count as usize || values_raw.len() != byte_count {
            return Err(ExceptionCode::InvalidRegisterData);
        }

        if RegisterBank::slot_for(start_address).is_none() {
            return Err(ExceptionCode::InvalidAddress);
        }

        if start_address as usize + count as usize > REGISTER_END_ADDRESS as usize {
            return Err(ExceptionCode::InvalidAddress);
        }

        let mut values = [0u16; REGISTER_COUNT];
        for (value, raw) in values.iter_mut().zip(values_raw.chunks_exact(2)) {
            *value = u16::from_be_bytes([raw[0], raw[1]]);
        }
        if values[..count as usize]
            .iter()
            .any(|&v| v > MAX_REGISTER_VALUE)
        {
            return Err(ExceptionCode::InvalidRegisterValue);
        }

        Ok(Self {
            start_address,
            count,
            values,
        })
    }

    /// Register values in request order
    pub fn values(&self) -> &[u16] {
        &self.values[..self.count as usize]
    }
}

/// Handler for the one write operation this slave supports
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteMultipleRegistersHandler;

impl WriteMultipleRegistersHandler {
    /// Validate `body`, then apply it to `bank` and build the confirmation.
    pub fn handle(&self, body: &[u8], bank: &RegisterBank) -> FrameOutcome {
        let request = match WriteMultipleRequest::parse(body) {
            Ok(request) => request,
            Err(code) => {
                debug!("FC16 rejected: {}", code);
                return FrameOutcome::Exception(code);
            }
        };

        if let Err(code) = bank.write_block(request.start_address, request.values()) {
            return FrameOutcome::Exception(code);
        }

        debug!(
            "FC16 applied: start=0x{:04X}, count={}",
            request.start_address, request.count
        );

        match PduBuilder::build_write_multiple_response(request.start_address, request.count) {
            Ok(pdu) => FrameOutcome::Success(pdu),
            // a 5-byte PDU always fits
            Err(_) => FrameOutcome::Exception(ExceptionCode::InvalidRegisterData),
        }
    }

    /// Function code served by this handler
    pub fn function_code(&self) -> u8 {
        FC_WRITE_MULTIPLE_REGISTERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_bank::InitialFill;

    fn body(start: u16, count: u16, byte_count: u8, values: &[u16]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(&start.to_be_bytes());
        b.extend_from_slice(&count.to_be_bytes());
        b.push(byte_count);
        for v in values {
            b.extend_from_slice(&v.to_be_bytes());
        }
        b
    }

    fn run(body: &[u8]) -> (FrameOutcome, RegisterBank) {
        let bank = RegisterBank::with_fill(InitialFill::Diagnostic);
        let outcome = WriteMultipleRegistersHandler.handle(body, &bank);
        (outcome, bank)
    }

    fn assert_exception(body: &[u8], code: ExceptionCode) {
        let (outcome, bank) = run(body);
        assert_eq!(outcome, FrameOutcome::Exception(code));
        assert_eq!(bank.snapshot(), [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_write_two_registers() {
        let (outcome, bank) = run(&body(0x0010, 2, 4, &[5, 900]));
        match outcome {
            FrameOutcome::Success(pdu) => {
                assert_eq!(pdu.as_slice(), &[0x10, 0x00, 0x10, 0x00, 0x02])
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(bank.read_slot(0), Some(5));
        assert_eq!(bank.read_slot(1), Some(900));
        assert_eq!(bank.read_slot(2), Some(2));
    }

    #[test]
    fn test_write_full_bank() {
        let values = [1023, 0, 1, 2, 3, 4, 5, 1000];
        let (outcome, bank) = run(&body(0x0010, 8, 16, &values));
        assert!(matches!(outcome, FrameOutcome::Success(_)));
        assert_eq!(bank.snapshot(), values);
    }

    #[test]
    fn test_count_out_of_range() {
        assert_exception(&body(0x0010, 0, 0, &[]), ExceptionCode::InvalidRegisterData);
        assert_exception(
            &body(0x0010, 9, 18, &[0; 9]),
            ExceptionCode::InvalidRegisterData,
        );
    }

    #[test]
    fn test_byte_count_mismatch() {
        assert_exception(
            &body(0x0010, 2, 3, &[1, 2]),
            ExceptionCode::InvalidRegisterData,
        );
        // Declared values missing from the frame
        assert_exception(&body(0x0010, 2, 4, &[1]), ExceptionCode::InvalidRegisterData);
        // Short fixed prefix
        assert_exception(&[0x00, 0x10, 0x00], ExceptionCode::InvalidRegisterData);
    }

    #[test]
    fn test_count_checked_before_address() {
        assert_exception(
            &body(0x0100, 9, 18, &[0; 9]),
            ExceptionCode::InvalidRegisterData,
        );
    }

    #[test]
    fn test_start_address_out_of_range() {
        assert_exception(&body(0x000F, 1, 2, &[1]), ExceptionCode::InvalidAddress);
        assert_exception(&body(0x0018, 1, 2, &[1]), ExceptionCode::InvalidAddress);
    }

    #[test]
    fn test_block_overrun() {
        assert_exception(&body(0x0017, 2, 4, &[1, 2]), ExceptionCode::InvalidAddress);
        let (outcome, _) = run(&body(0x0017, 1, 2, &[1]));
        assert!(matches!(outcome, FrameOutcome::Success(_)));
    }

    #[test]
    fn test_value_ceiling_writes_nothing() {
        // The offending value is last: earlier ones must not land
        assert_exception(
            &body(0x0010, 3, 6, &[10, 20, 1024]),
            ExceptionCode::InvalidRegisterValue,
        );
        assert_exception(
            &body(0x0012, 2, 4, &[0xFFFF, 1]),
            ExceptionCode::InvalidRegisterValue,
        );
    }

    #[test]
    fn test_address_checked_before_values() {
        assert_exception(
            &body(0x0017, 2, 4, &[5000, 5000]),
            ExceptionCode::InvalidAddress,
        );
    }
}

//! Reply frame assembly

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::constants::MBAP_HEADER_LEN;
use crate::error::ModbusResult;
use crate::exception::ExceptionCode;
use crate::frame::MbapHeader;
use crate::pdu::{ModbusPdu, PduBuilder};

/// Result of handling one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Complete reply PDU, function code included
    Success(ModbusPdu),
    /// Request refused with a reason code
    Exception(ExceptionCode),
}

impl FrameOutcome {
    /// True for exception outcomes
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }
}

/// Serializes outcomes into MBAP reply frames
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Build the full reply frame for `request`.
    ///
    /// Transaction and unit ids are echoed, the protocol id is zero and the
    /// length field counts the unit id plus the reply PDU.
    pub fn build(request: &MbapHeader, function_code: u8, outcome: &FrameOutcome) -> ModbusResult<Bytes> {
        let exception_pdu;
        let pdu = match outcome {
            FrameOutcome::Success(pdu) => pdu,
            FrameOutcome::Exception(code) => {
                exception_pdu = PduBuilder::build_exception(function_code, *code)?;
                &exception_pdu
            }
        };

        let header = request.reply(pdu.len());
        let mut buf = BytesMut::with_capacity(MBAP_HEADER_LEN + 1 + pdu.len());
        header.encode(&mut buf);
        buf.put_slice(pdu.as_slice());

        debug!(
            "Reply built: txn={}, len={}, exception={}",
            header.transaction_id,
            header.length,
            outcome.is_exception()
        );

        Ok(buf.freeze())
    }
}

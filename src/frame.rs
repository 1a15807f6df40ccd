//! MBAP frame validation
//!
//! A received buffer is accepted only when, in this order:
//! 1. it holds at least a full header and a function code,
//! 2. the protocol identifier is zero,
//! 3. the unit identifier matches this station (no broadcast),
//! 4. the length field equals `received_length - 6`.
//!
//! Rejected frames get no reply; only the addressed unit answers.

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tracing::debug;

use crate::constants::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN, MIN_FRAME_LEN, MODBUS_PROTOCOL_ID};
use crate::pdu::ModbusPdu;

/// Parsed MBAP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Opaque, echoed back unchanged
    pub transaction_id: u16,
    /// Zero for Modbus
    pub protocol_id: u16,
    /// Byte count of everything after the length field
    pub length: u16,
    /// Addressed station
    pub unit_id: u8,
}

impl MbapHeader {
    /// Read the 7 header bytes. Returns `None` on a short buffer.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < MBAP_HEADER_LEN + 1 {
            return None;
        }
        Some(Self {
            transaction_id: u16::from_be_bytes([buf[0], buf[1]]),
            protocol_id: u16::from_be_bytes([buf[2], buf[3]]),
            length: u16::from_be_bytes([buf[4], buf[5]]),
            unit_id: buf[6],
        })
    }

    /// Reply header for a PDU of `pdu_len` bytes
    pub fn reply(&self, pdu_len: usize) -> Self {
        Self {
            transaction_id: self.transaction_id,
            protocol_id: MODBUS_PROTOCOL_ID,
            length: (pdu_len + 1) as u16,
            unit_id: self.unit_id,
        }
    }

    /// Serialize into `buf`
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.transaction_id);
        buf.put_u16(self.protocol_id);
        buf.put_u16(self.length);
        buf.put_u8(self.unit_id);
    }
}

/// Why a frame was dropped without reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameRejection {
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },

    #[error("protocol id 0x{protocol_id:04X} is not Modbus")]
    ProtocolMismatch { protocol_id: u16 },

    #[error("frame addressed to unit {unit_id}, this station is {expected}")]
    UnitMismatch { unit_id: u8, expected: u8 },

    #[error("length field {declared} does not match {actual} received bytes")]
    LengthMismatch { declared: u16, actual: usize },

    #[error("length field {declared} exceeds the maximum PDU")]
    TooLong { declared: u16 },
}

/// A validated request that owns a copy of its PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub header: MbapHeader,
    pub pdu: ModbusPdu,
}

impl RequestFrame {
    /// Function code byte
    #[inline]
    pub fn function_code(&self) -> u8 {
        // validation guarantees at least one PDU byte
        self.pdu.function_code().unwrap_or_default()
    }
}

/// Validate a received buffer against this station's unit id.
///
/// On success the PDU is copied, so the caller's buffer may be reused
/// as soon as this returns.
pub fn validate_frame(buf: &[u8], unit_id: u8) -> Result<RequestFrame, FrameRejection> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(FrameRejection::TooShort { len: buf.len() });
    }
    let header = MbapHeader::parse(buf).ok_or(FrameRejection::TooShort { len: buf.len() })?;

    if header.protocol_id != MODBUS_PROTOCOL_ID {
        return Err(FrameRejection::ProtocolMismatch {
            protocol_id: header.protocol_id,
        });
    }

    if header.unit_id != unit_id {
        return Err(FrameRejection::UnitMismatch {
            unit_id: header.unit_id,
            expected: unit_id,
        });
    }

    let actual = buf.len() - MBAP_HEADER_LEN;
    if header.length as usize != actual {
        return Err(FrameRejection::LengthMismatch {
            declared: header.length,
            actual,
        });
    }

    if header.length as usize > MAX_MBAP_LENGTH {
        return Err(FrameRejection::TooLong {
            declared: header.length,
        });
    }

    let pdu = ModbusPdu::from_slice(&buf[MBAP_HEADER_LEN + 1..]).map_err(|_| {
        FrameRejection::TooLong {
            declared: header.length,
        }
    })?;

    debug!(
        "Frame accepted: txn={}, unit={}, len={}",
        header.transaction_id, header.unit_id, header.length
    );

    Ok(RequestFrame { header, pdu })
}

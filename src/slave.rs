//! Modbus slave engine
//!
//! The transport hands each received buffer to [`ModbusSlave::on_frame`]
//! together with a [`FrameSink`] for the reply. The buffer is only borrowed
//! for the duration of the call; the slave copies what it needs before
//! handling.
//!
//! Three things can happen to a frame:
//! - it is dropped silently (bad header, foreign unit, length mismatch),
//! - it is answered with a success or exception reply,
//! - the reply is dropped because the sink cannot take it right now.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::SlaveConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::{ModbusError, ModbusResult};
use crate::frame::{validate_frame, FrameRejection};
use crate::register_bank::RegisterBank;
use crate::response::{FrameOutcome, ResponseBuilder};

/// Outbound side of the transport
pub trait FrameSink {
    /// Bytes the transport can accept without blocking
    fn available(&self) -> usize;

    /// Hand a complete frame to the transport
    fn send(&mut self, frame: &[u8]) -> ModbusResult<()>;
}

/// What became of one received buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameDisposition {
    /// No reply: the frame was not for this station or was malformed
    Dropped(FrameRejection),
    /// Reply handed to the sink
    Replied(FrameOutcome),
    /// Reply built but the sink had no room for it
    ReplyDropped(FrameOutcome),
}

/// Counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaveStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub replies_sent: u64,
    pub exceptions_sent: u64,
    pub replies_dropped: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
    replies_sent: AtomicU64,
    exceptions_sent: AtomicU64,
    replies_dropped: AtomicU64,
}

impl StatCounters {
    fn snapshot(&self) -> SlaveStats {
        SlaveStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            exceptions_sent: self.exceptions_sent.load(Ordering::Relaxed),
            replies_dropped: self.replies_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Protocol engine bound to one register bank
#[derive(Debug)]
pub struct ModbusSlave {
    unit_id: u8,
    bank: Arc<RegisterBank>,
    dispatcher: CommandDispatcher,
    stats: StatCounters,
}

impl ModbusSlave {
    /// Create a slave answering to `unit_id`
    pub fn new(unit_id: u8, bank: Arc<RegisterBank>) -> Self {
        Self {
            unit_id,
            bank,
            dispatcher: CommandDispatcher::new(),
            stats: StatCounters::default(),
        }
    }

    /// Create a slave and its bank from a validated configuration
    pub fn from_config(config: &SlaveConfig) -> ModbusResult<Self> {
        config.validate()?;
        let bank = Arc::new(RegisterBank::with_fill(config.initial_fill));
        Ok(Self::new(config.unit_id, bank))
    }

    /// Station address
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Shared register bank
    pub fn bank(&self) -> &Arc<RegisterBank> {
        &self.bank
    }

    /// Current counters
    pub fn stats(&self) -> SlaveStats {
        self.stats.snapshot()
    }

    /// Handle a buffer and return the reply frame, if any.
    pub fn process(&self, buf: &[u8]) -> Option<Bytes> {
        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);
        match self.handle(buf) {
            Ok((reply, outcome)) => {
                if outcome.is_exception() {
                    self.stats.exceptions_sent.fetch_add(1, Ordering::Relaxed);
                }
                self.stats.replies_sent.fetch_add(1, Ordering::Relaxed);
                Some(reply)
            }
            Err(_) => None,
        }
    }

    /// Transport callback: handle `buf` and push any reply into `sink`.
    ///
    /// Never blocks and never retries. A reply larger than
    /// `sink.available()` is dropped; the peer retransmits.
    pub fn on_frame<S: FrameSink + ?Sized>(&self, buf: &[u8], sink: &mut S) -> FrameDisposition {
        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);

        let (reply, outcome) = match self.handle(buf) {
            Ok(built) => built,
            Err(rejection) => return FrameDisposition::Dropped(rejection),
        };

        if reply.len() > sink.available() {
            warn!(
                "Reply dropped: {} bytes, transport has room for {}",
                reply.len(),
                sink.available()
            );
            self.stats.replies_dropped.fetch_add(1, Ordering::Relaxed);
            return FrameDisposition::ReplyDropped(outcome);
        }

        if let Err(e) = sink.send(&reply) {
            warn!("Reply dropped: {}", e);
            self.stats.replies_dropped.fetch_add(1, Ordering::Relaxed);
            return FrameDisposition::ReplyDropped(outcome);
        }

        if outcome.is_exception() {
            self.stats.exceptions_sent.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.replies_sent.fetch_add(1, Ordering::Relaxed);
        FrameDisposition::Replied(outcome)
    }

    fn handle(&self, buf: &[u8]) -> Result<(Bytes, FrameOutcome), FrameRejection> {
        let request = match validate_frame(buf, self.unit_id) {
            Ok(request) => request,
            Err(rejection) => {
                debug!("Frame dropped: {}", rejection);
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                return Err(rejection);
            }
        };

        let outcome = self.dispatcher.dispatch(&request, &self.bank);
        // An exception PDU is two bytes; building it cannot overflow
        let reply = ResponseBuilder::build(&request.header, request.function_code(), &outcome)
            .unwrap_or_default();
        Ok((reply, outcome))
    }
}

/// Fixed-capacity sink collecting one reply for a transport to flush
#[derive(Debug, Clone)]
pub struct BufferSink {
    capacity: usize,
    buf: Vec<u8>,
}

impl BufferSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Take the pending bytes, leaving the sink empty
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl FrameSink for BufferSink {
    fn available(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
        if frame.len() > self.available() {
            return Err(ModbusError::transport("sink full"));
        }
        self.buf.extend_from_slice(frame);
        Ok(())
    }
}

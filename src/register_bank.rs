//! # Register Bank
//!
//! The eight holding registers exposed over Modbus and mirrored on the panel.
//!
//! The bank is written from the network side and read from the display
//! loop, which may run on another thread. Every access goes through one
//! mutex, so a reader never sees a half-applied block write and two block
//! writes never interleave.
//!
//! ## Address Space
//!
//! | Logical address | Slot |
//! |-----------------|------|
//! | 0x0010 | 0 |
//! | ... | ... |
//! | 0x0017 | 7 |
//!
//! Every stored value lies in `0..=1023`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::constants::{
    MAX_REGISTER_VALUE, REGISTER_BASE_ADDRESS, REGISTER_COUNT, REGISTER_END_ADDRESS,
};
use crate::error::{ModbusError, ModbusResult};
use crate::exception::ExceptionCode;

/// Start-up content of the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialFill {
    /// All registers zero
    #[default]
    Zero,
    /// Slot `i` holds `i`, handy for checking the display wiring
    Diagnostic,
}

/// Shared, lock-guarded register storage.
///
/// # Example
///
/// ```rust
/// use voltage_modbus_slave::RegisterBank;
///
/// let bank = RegisterBank::new();
/// bank.write_block(0x0010, &[5, 900]).unwrap();
/// assert_eq!(bank.read(0x0011).unwrap(), 900);
/// ```
#[derive(Debug, Default)]
pub struct RegisterBank {
    slots: Mutex<[u16; REGISTER_COUNT]>,
}

impl RegisterBank {
    /// Create a zero-filled bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bank with the given start-up content
    pub fn with_fill(fill: InitialFill) -> Self {
        let mut slots = [0u16; REGISTER_COUNT];
        if fill == InitialFill::Diagnostic {
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = i as u16;
            }
        }
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Map a logical address to its slot
    #[inline]
    pub fn slot_for(address: u16) -> Option<usize> {
        if (REGISTER_BASE_ADDRESS..REGISTER_END_ADDRESS).contains(&address) {
            Some((address - REGISTER_BASE_ADDRESS) as usize)
        } else {
            None
        }
    }

    /// Check a block `[start, start + count)` lies inside the bank
    #[inline]
    pub fn contains_block(start: u16, count: usize) -> bool {
        Self::slot_for(start).is_some()
            && (start as usize) + count <= REGISTER_END_ADDRESS as usize
    }

    /// Read one register by logical address
    pub fn read(&self, address: u16) -> ModbusResult<u16> {
        let slot = Self::slot_for(address).ok_or(ModbusError::InvalidAddress { address })?;
        Ok(self.lock()[slot])
    }

    /// Read one register by slot index
    pub fn read_slot(&self, slot: usize) -> Option<u16> {
        self.lock().get(slot).copied()
    }

    /// Read two slots under a single lock
    pub fn read_pair(&self, a: usize, b: usize) -> Option<(u16, u16)> {
        let slots = self.lock();
        Some((*slots.get(a)?, *slots.get(b)?))
    }

    /// Copy of all slots
    pub fn snapshot(&self) -> [u16; REGISTER_COUNT] {
        *self.lock()
    }

    /// Write one register by logical address
    pub fn write(&self, address: u16, value: u16) -> ModbusResult<()> {
        let slot = Self::slot_for(address).ok_or(ModbusError::InvalidAddress { address })?;
        if value > MAX_REGISTER_VALUE {
            return Err(ModbusError::InvalidValue { value });
        }
        self.lock()[slot] = value;
        trace!("Register 0x{:04X} = {}", address, value);
        Ok(())
    }

    /// Write a contiguous block starting at `start`.
    ///
    /// All-or-nothing: the range and every value are checked before the
    /// first slot changes. The check loop and the write loop must stay
    /// separate.
    pub fn write_block(&self, start: u16, values: &[u16]) -> Result<(), ExceptionCode> {
        if values.is_empty() || !Self::contains_block(start, values.len()) {
            return Err(ExceptionCode::InvalidAddress);
        }
        if values.iter().any(|&v| v > MAX_REGISTER_VALUE) {
            return Err(ExceptionCode::InvalidRegisterValue);
        }

        let first = (start - REGISTER_BASE_ADDRESS) as usize;
        let mut slots = self.lock();
        slots[first..first + values.len()].copy_from_slice(values);
        drop(slots);

        trace!(
            "Registers 0x{:04X}..0x{:04X} = {:?}",
            start,
            start as usize + values.len(),
            values
        );
        Ok(())
    }

    // A panic while holding the lock cannot leave a torn block: slots are
    // only touched by a single copy_from_slice or a single store.
    fn lock(&self) -> MutexGuard<'_, [u16; REGISTER_COUNT]> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_fill() {
        assert_eq!(RegisterBank::new().snapshot(), [0; 8]);
        assert_eq!(
            RegisterBank::with_fill(InitialFill::Diagnostic).snapshot(),
            [0, 1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_slot_mapping() {
        assert_eq!(RegisterBank::slot_for(0x0010), Some(0));
        assert_eq!(RegisterBank::slot_for(0x0017), Some(7));
        assert_eq!(RegisterBank::slot_for(0x000F), None);
        assert_eq!(RegisterBank::slot_for(0x0018), None);
    }

    #[test]
    fn test_contains_block() {
        assert!(RegisterBank::contains_block(0x0010, 8));
        assert!(RegisterBank::contains_block(0x0017, 1));
        assert!(!RegisterBank::contains_block(0x0017, 2));
        assert!(!RegisterBank::contains_block(0xFFFF, 1));
    }

    #[test]
    fn test_write_block_roundtrip() {
        let bank = RegisterBank::new();
        bank.write_block(0x0010, &[5, 900]).unwrap();
        assert_eq!(bank.read_slot(0), Some(5));
        assert_eq!(bank.read_slot(1), Some(900));
        assert_eq!(bank.read_pair(1, 0), Some((900, 5)));
    }

    #[test]
    fn test_write_block_is_all_or_nothing() {
        let bank = RegisterBank::with_fill(InitialFill::Diagnostic);
        let before = bank.snapshot();

        assert_eq!(
            bank.write_block(0x0010, &[1, 2, 1024]),
            Err(ExceptionCode::InvalidRegisterValue)
        );
        assert_eq!(
            bank.write_block(0x0016, &[1, 2, 3]),
            Err(ExceptionCode::InvalidAddress)
        );
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_single_write() {
        let bank = RegisterBank::new();
        bank.write(0x0013, 1023).unwrap();
        assert_eq!(bank.read(0x0013).unwrap(), 1023);
        assert!(matches!(
            bank.write(0x0013, 1024),
            Err(ModbusError::InvalidValue { value: 1024 })
        ));
        assert!(matches!(
            bank.read(0x0020),
            Err(ModbusError::InvalidAddress { address: 0x0020 })
        ));
    }

    #[test]
    fn test_concurrent_block_writes_are_never_torn() {
        // Writers alternate between two uniform patterns; a reader must only
        // ever see one pattern or the other across the whole bank.
        let bank = Arc::new(RegisterBank::new());
        let writer = {
            let bank = Arc::clone(&bank);
            thread::spawn(move || {
                for i in 0..1000u16 {
                    let v = if i % 2 == 0 { 0x0155 } else { 0x02AA };
                    bank.write_block(0x0010, &[v; 8]).unwrap();
                }
            })
        };

        for _ in 0..1000 {
            let snap = bank.snapshot();
            assert!(snap.iter().all(|&v| v <= MAX_REGISTER_VALUE));
            assert!(snap.iter().all(|&v| v == snap[0]), "torn read: {:?}", snap);
        }
        writer.join().unwrap();
    }
}

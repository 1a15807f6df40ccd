//! Button debouncing
//!
//! The panel buttons are sampled at a fixed interval. A new state is only
//! reported once it has been read twice in a row: the poll that sees the
//! change arms the debouncer, the next equal reading confirms it.

/// Physical button input, one bit per button (bit 0 = leftmost)
pub trait ButtonSource {
    fn read_buttons(&mut self) -> u8;
}

impl<F: FnMut() -> u8> ButtonSource for F {
    fn read_buttons(&mut self) -> u8 {
        self()
    }
}

/// Two-sample debouncer
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonDebouncer {
    last: u8,
    armed: bool,
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; returns the mask when a change is confirmed.
    pub fn poll(&mut self, reading: u8) -> Option<u8> {
        if reading == self.last {
            if self.armed {
                self.armed = false;
                return Some(reading);
            }
            None
        } else {
            self.last = reading;
            self.armed = true;
            None
        }
    }

    /// Last sampled mask, confirmed or not
    pub fn last_reading(&self) -> u8 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_needs_confirmation() {
        let mut debouncer = ButtonDebouncer::new();
        assert_eq!(debouncer.poll(0b0100), None);
        assert_eq!(debouncer.poll(0b0100), Some(0b0100));
        // Held down: no repeat
        assert_eq!(debouncer.poll(0b0100), None);
        assert_eq!(debouncer.poll(0b0100), None);
    }

    #[test]
    fn test_bounce_is_ignored() {
        let mut debouncer = ButtonDebouncer::new();
        assert_eq!(debouncer.poll(0b0001), None);
        assert_eq!(debouncer.poll(0b0000), None);
        assert_eq!(debouncer.poll(0b0001), None);
        assert_eq!(debouncer.poll(0b0001), Some(0b0001));
    }

    #[test]
    fn test_release_is_reported() {
        let mut debouncer = ButtonDebouncer::new();
        debouncer.poll(0b1000);
        debouncer.poll(0b1000);
        assert_eq!(debouncer.poll(0), None);
        assert_eq!(debouncer.poll(0), Some(0));
        assert_eq!(debouncer.last_reading(), 0);
    }

    #[test]
    fn test_closure_source() {
        let mut samples = vec![3u8, 1].into_iter();
        let mut source = move || samples.next().unwrap_or(0);
        assert_eq!(source.read_buttons(), 3);
        assert_eq!(source.read_buttons(), 1);
        assert_eq!(source.read_buttons(), 0);
    }
}

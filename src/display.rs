//! # Panel Display
//!
//! The panel shows two registers side by side and lights one LED per
//! shown register. Pressing a single button selects that register: the
//! previous selection moves to the second position. The register with the
//! lower index is always shown on the left.

use tracing::debug;

use crate::register_bank::RegisterBank;

/// Output side of the panel
pub trait DisplayRenderer {
    /// Show two values, left then right
    fn render(&mut self, value_a: u16, value_b: u16, align_right: bool);

    /// Light the LEDs of two slots
    fn highlight(&mut self, slot_a: u8, slot_b: u8);
}

/// Which two slots are shown; order is as selected, not as rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySelection {
    pub primary: u8,
    pub secondary: u8,
}

impl Default for DisplaySelection {
    fn default() -> Self {
        Self {
            primary: 0,
            secondary: 1,
        }
    }
}

impl DisplaySelection {
    /// Slots ordered for rendering: lower index first
    pub fn ordered(&self) -> (u8, u8) {
        if self.primary < self.secondary {
            (self.primary, self.secondary)
        } else {
            (self.secondary, self.primary)
        }
    }
}

/// Bit pattern for a shift-register LED driver, one bit per slot
pub fn led_mask(slot_a: u8, slot_b: u8) -> u8 {
    (1u8 << (slot_a & 7)) | (1u8 << (slot_b & 7))
}

/// Tracks the selection and draws it
#[derive(Debug, Clone, Default)]
pub struct DisplaySelectionPresenter {
    selection: DisplaySelection,
}

impl DisplaySelectionPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: DisplaySelection) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> DisplaySelection {
        self.selection
    }

    /// Apply a debounced button mask. Returns `true` if the selection changed.
    ///
    /// Only masks with exactly one bit set select anything.
    pub fn on_buttons(&mut self, mask: u8) -> bool {
        if mask.count_ones() != 1 {
            return false;
        }
        let index = mask.trailing_zeros() as u8;
        if index == self.selection.primary {
            return false;
        }

        self.selection = DisplaySelection {
            primary: index,
            secondary: self.selection.primary,
        };
        debug!(
            "Display selection: primary={}, secondary={}",
            self.selection.primary, self.selection.secondary
        );
        true
    }

    /// Read the selected registers and draw them
    pub fn render<R: DisplayRenderer + ?Sized>(&self, bank: &RegisterBank, renderer: &mut R) {
        let (left, right) = self.selection.ordered();
        renderer.highlight(self.selection.primary, self.selection.secondary);
        if let Some((a, b)) = bank.read_pair(left as usize, right as usize) {
            renderer.render(a, b, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_bank::InitialFill;

    #[derive(Default)]
    struct Recorder {
        rendered: Vec<(u16, u16, bool)>,
        highlighted: Vec<(u8, u8)>,
    }

    impl DisplayRenderer for Recorder {
        fn render(&mut self, value_a: u16, value_b: u16, align_right: bool) {
            self.rendered.push((value_a, value_b, align_right));
        }

        fn highlight(&mut self, slot_a: u8, slot_b: u8) {
            self.highlighted.push((slot_a, slot_b));
        }
    }

    #[test]
    fn test_single_button_selects() {
        let mut presenter = DisplaySelectionPresenter::new();
        assert!(presenter.on_buttons(0b0000_1000));
        assert_eq!(
            presenter.selection(),
            DisplaySelection {
                primary: 3,
                secondary: 0
            }
        );

        // Same button again: no change
        assert!(!presenter.on_buttons(0b0000_1000));
        assert_eq!(presenter.selection().primary, 3);
        assert_eq!(presenter.selection().secondary, 0);
    }

    #[test]
    fn test_zero_or_many_buttons_ignored() {
        let mut presenter = DisplaySelectionPresenter::new();
        assert!(!presenter.on_buttons(0));
        assert!(!presenter.on_buttons(0b0110_0000));
        assert!(!presenter.on_buttons(0xFF));
        assert_eq!(presenter.selection(), DisplaySelection::default());
    }

    #[test]
    fn test_selecting_secondary_swaps() {
        let mut presenter = DisplaySelectionPresenter::new();
        assert!(presenter.on_buttons(0b0000_0010));
        assert_eq!(
            presenter.selection(),
            DisplaySelection {
                primary: 1,
                secondary: 0
            }
        );
    }

    #[test]
    fn test_render_lower_index_on_left() {
        let bank = RegisterBank::with_fill(InitialFill::Diagnostic);
        bank.write_block(0x0010, &[100]).unwrap();
        bank.write_block(0x0017, &[700]).unwrap();

        let mut presenter = DisplaySelectionPresenter::new();
        presenter.on_buttons(0b1000_0000);

        let mut recorder = Recorder::default();
        presenter.render(&bank, &mut recorder);

        assert_eq!(recorder.highlighted, vec![(7, 0)]);
        assert_eq!(recorder.rendered, vec![(100, 700, true)]);
    }

    #[test]
    fn test_led_mask() {
        assert_eq!(led_mask(0, 1), 0b0000_0011);
        assert_eq!(led_mask(7, 3), 0b1000_1000);
    }
}

//! Key event model and raw FIFO word codec.
//!
//! The scan hardware reports each key transition as one 32-bit FIFO word:
//!
//! ```text
//! bit 31       up/down flag (1 = key released)
//! bit 30       scan-cycle flag (toggles once per matrix sweep)
//! bits 29..8   reserved
//! bits  7..0   key code: (row * columns) + column
//! ```
//!
//! Two key codes are carried in-band by the hardware: `0xF5` flags a
//! ghost-key condition and `0xFF` is the filler value the FIFO holds after a
//! reset. Neither reaches the application; [`FifoWord::decode`] separates
//! them from ordinary events so the driver can react.
//!
//! The firmware-side queue additionally reserves three key codes at the top
//! of the range (`0xFD..=0xFF`) for markers it generates itself; see the
//! constants on [`KeyEvent`].

/// Raw FIFO word layout.
pub mod raw {
    /// Bits 0..=7: key code.
    pub const KEY_CODE_MASK: u32 = 0x0000_00FF;
    /// Bit 30: scan-cycle flag, toggled by the hardware once per sweep.
    pub const SCAN_CYCLE_MASK: u32 = 0x4000_0000;
    /// Bit 31: set for key-up, clear for key-down.
    pub const KEY_UP_MASK: u32 = 0x8000_0000;

    /// In-band key code flagging a ghost-key condition.
    pub const GHOST_CODE: u8 = 0xF5;
    /// Key code of the filler words the FIFO holds after a reset.
    pub const FIFO_INIT_CODE: u8 = 0xFF;
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// Key pressed.
    Down,
    /// Key released.
    Up,
}

/// A single key transition as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// Position in the matrix: `(row * columns) + column`.
    pub key_code: u8,
    /// Up/down flag.
    pub action: KeyAction,
    /// Toggles once per scan cycle. Consumers may use it to tell whether two
    /// events were detected in the same matrix sweep; it carries no timing
    /// information.
    pub scan_cycle: bool,
}

impl KeyEvent {
    /// Marker queued when a scan cycle is discarded (ghost) or the firmware
    /// queue overflows.
    pub const ROLLOVER: u8 = 0xFF;
    /// Marker for the end of a scan cycle.
    pub const END_OF_SCAN_CYCLE: u8 = 0xFE;
    /// Key-code value reported when no key is pressed.
    pub const EVENT_NONE: u8 = 0xFD;

    /// Decode a raw FIFO word.
    ///
    /// Plain bit extraction; in-band marker codes are *not* filtered here,
    /// use [`FifoWord::decode`] for classified input.
    #[allow(clippy::cast_possible_truncation)] // masked to 8 bits first
    pub fn from_raw(word: u32) -> Self {
        Self {
            key_code: (word & raw::KEY_CODE_MASK) as u8,
            action: if word & raw::KEY_UP_MASK != 0 {
                KeyAction::Up
            } else {
                KeyAction::Down
            },
            scan_cycle: word & raw::SCAN_CYCLE_MASK != 0,
        }
    }

    /// Encode this event as a raw FIFO word (used by tests and mocks).
    pub fn to_raw(self) -> u32 {
        let mut word = u32::from(self.key_code);
        if self.scan_cycle {
            word |= raw::SCAN_CYCLE_MASK;
        }
        if matches!(self.action, KeyAction::Up) {
            word |= raw::KEY_UP_MASK;
        }
        word
    }

    /// A rollover marker carrying the given scan-cycle flag.
    pub const fn rollover(scan_cycle: bool) -> Self {
        Self {
            key_code: Self::ROLLOVER,
            action: KeyAction::Down,
            scan_cycle,
        }
    }

    /// `true` for rollover markers.
    pub fn is_rollover(&self) -> bool {
        self.key_code == Self::ROLLOVER
    }

    /// `true` for ordinary matrix positions, `false` for the marker codes
    /// `0xFD..=0xFF`.
    pub fn is_matrix_key(&self) -> bool {
        self.key_code < Self::EVENT_NONE
    }
}

/// A classified raw FIFO word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoWord {
    /// An ordinary key transition.
    Event(KeyEvent),
    /// Ghost-key marker; carries the scan-cycle flag of the offending sweep.
    Ghost {
        /// Scan-cycle flag of the sweep that ghosted.
        scan_cycle: bool,
    },
    /// Post-reset filler, to be ignored.
    InitFiller,
}

impl FifoWord {
    /// Classify a raw FIFO word.
    #[allow(clippy::cast_possible_truncation)] // masked to 8 bits first
    pub fn decode(word: u32) -> Self {
        match (word & raw::KEY_CODE_MASK) as u8 {
            raw::FIFO_INIT_CODE => Self::InitFiller,
            raw::GHOST_CODE => Self::Ghost {
                scan_cycle: word & raw::SCAN_CYCLE_MASK != 0,
            },
            _ => Self::Event(KeyEvent::from_raw(word)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::{raw, FifoWord, KeyAction, KeyEvent};

    #[test]
    fn test_from_raw_extracts_fields() {
        // Key 0x2A, released, scan-cycle flag set.
        let word = 0x8000_0000 | 0x4000_0000 | 0x2A;
        let event = KeyEvent::from_raw(word);
        assert_eq!(event.key_code, 0x2A);
        assert_eq!(event.action, KeyAction::Up);
        assert!(event.scan_cycle);
    }

    #[test]
    fn test_from_raw_key_down_clears_flag() {
        let event = KeyEvent::from_raw(0x07);
        assert_eq!(event.key_code, 0x07);
        assert_eq!(event.action, KeyAction::Down);
        assert!(!event.scan_cycle);
    }

    #[test]
    fn test_from_raw_ignores_reserved_bits() {
        // Reserved bits 8..=29 must not leak into the key code.
        let event = KeyEvent::from_raw(0x3FFF_FF05);
        assert_eq!(event.key_code, 0x05);
        assert_eq!(event.action, KeyAction::Down);
    }

    #[test]
    fn test_to_raw_round_trips() {
        let event = KeyEvent {
            key_code: 0x13,
            action: KeyAction::Up,
            scan_cycle: true,
        };
        assert_eq!(KeyEvent::from_raw(event.to_raw()), event);
        assert_eq!(event.to_raw(), 0xC000_0013);
    }

    #[test]
    fn test_decode_classifies_ghost() {
        let word = u32::from(raw::GHOST_CODE) | raw::SCAN_CYCLE_MASK;
        assert_eq!(
            FifoWord::decode(word),
            FifoWord::Ghost { scan_cycle: true }
        );
    }

    #[test]
    fn test_decode_classifies_init_filler() {
        // The filler code wins over event decoding regardless of flag bits.
        assert_eq!(FifoWord::decode(0x0000_00FF), FifoWord::InitFiller);
        assert_eq!(FifoWord::decode(0xC000_00FF), FifoWord::InitFiller);
    }

    #[test]
    fn test_decode_classifies_ordinary_event() {
        match FifoWord::decode(0x10) {
            FifoWord::Event(event) => {
                assert_eq!(event.key_code, 0x10);
                assert_eq!(event.action, KeyAction::Down);
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_rollover_marker() {
        let marker = KeyEvent::rollover(true);
        assert!(marker.is_rollover());
        assert!(!marker.is_matrix_key());
        assert!(marker.scan_cycle);
        // Ordinary keys are matrix keys.
        assert!(KeyEvent::from_raw(0x00).is_matrix_key());
        // All three reserved codes are excluded.
        for code in [KeyEvent::EVENT_NONE, KeyEvent::END_OF_SCAN_CYCLE, KeyEvent::ROLLOVER] {
            let event = KeyEvent {
                key_code: code,
                action: KeyAction::Down,
                scan_cycle: false,
            };
            assert!(!event.is_matrix_key());
        }
    }
}

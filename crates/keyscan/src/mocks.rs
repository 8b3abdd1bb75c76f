//! Mock scan hardware for host-side tests.
//!
//! `MockKeyscanHardware` implements [`KeyscanHardware`] over a scripted
//! FIFO: tests push raw words with [`push_raw`] and the driver drains them
//! as if the scan block had produced them. Control calls are recorded in
//! public fields for assertions.
//!
//! [`push_raw`]: MockKeyscanHardware::push_raw

#![cfg(any(test, feature = "std"))]

use core::convert::Infallible;

use crate::hal::{KeyscanHardware, MatrixConfig};

/// Depth of the scripted FIFO; generous so tests can script overflow runs.
const MOCK_FIFO_DEPTH: usize = 64;

/// Scripted scan hardware.
pub struct MockKeyscanHardware {
    fifo: heapless::Deque<u32, MOCK_FIFO_DEPTH>,
    /// Last geometry programmed by `configure`.
    pub configured: Option<MatrixConfig>,
    /// Number of reset pulses issued.
    pub reset_count: usize,
    /// Current scan-enable state.
    pub scan_enabled: bool,
    /// Current ghost-detection state.
    pub ghost_detection: bool,
    /// Current interrupt-gate state.
    pub interrupt_enabled: bool,
    /// Number of interrupt acknowledgements.
    pub interrupt_clears: usize,
}

impl MockKeyscanHardware {
    /// Create a mock with an empty FIFO and all controls off.
    pub fn new() -> Self {
        Self {
            fifo: heapless::Deque::new(),
            configured: None,
            reset_count: 0,
            scan_enabled: false,
            ghost_detection: false,
            interrupt_enabled: false,
            interrupt_clears: 0,
        }
    }

    /// Script a raw FIFO word. Returns `false` when the scripted FIFO is
    /// full (the word is dropped).
    pub fn push_raw(&mut self, word: u32) -> bool {
        self.fifo.push_back(word).is_ok()
    }

    /// Number of scripted words not yet drained.
    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }
}

impl Default for MockKeyscanHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyscanHardware for MockKeyscanHardware {
    type Error = Infallible;

    fn configure(&mut self, config: &MatrixConfig) -> Result<(), Infallible> {
        self.configured = Some(*config);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Infallible> {
        self.reset_count = self.reset_count.saturating_add(1);
        self.fifo.clear();
        Ok(())
    }

    fn set_scan_enabled(&mut self, enabled: bool) -> Result<(), Infallible> {
        self.scan_enabled = enabled;
        Ok(())
    }

    fn set_ghost_detection(&mut self, enabled: bool) -> Result<(), Infallible> {
        self.ghost_detection = enabled;
        Ok(())
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Infallible> {
        self.interrupt_enabled = enabled;
        Ok(())
    }

    fn read_fifo_word(&mut self) -> Option<u32> {
        self.fifo.pop_front()
    }

    fn clear_interrupt(&mut self) {
        self.interrupt_clears = self.interrupt_clears.saturating_add(1);
    }

    /// Resolve once the scripted FIFO is non-empty, yielding to the
    /// executor on each poll so the scripting task can run.
    async fn wait_for_interrupt(&mut self) {
        while self.fifo.is_empty() {
            embassy_futures::yield_now().await;
        }
    }
}

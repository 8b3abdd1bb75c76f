//! Keyscan driver state machine.
//!
//! The driver owns the hardware behind [`KeyscanHardware`] and a firmware
//! FIFO of decoded [`KeyEvent`]s. The interface is a queue from the
//! consumer's perspective: key up/down events are a stream coming out of
//! [`next_event`], and the driver additionally supports resetting the
//! hardware and turning scanning on and off.
//!
//! # Ghost handling
//!
//! The hardware flags ghost conditions in-band (key code `0xF5`). Because a
//! ghost invalidates every transition seen in the same matrix sweep, the
//! driver records a rollback mark on the firmware queue at each scan-cycle
//! boundary; when the ghost marker arrives it rolls the queue back to the
//! mark and queues a single `ROLLOVER` event in place of the retracted
//! cycle. Events from earlier, completed cycles are never touched.
//!
//! # Overflow handling
//!
//! When the firmware queue is full, the incoming event is dropped and a
//! `ROLLOVER` marker is queued into the queue's reserved slot instead, so
//! the consumer always learns that the stream has a gap. At most one
//! trailing marker is kept per overflow episode.
//!
//! [`next_event`]: KeyscanDriver::next_event

use collections::{EventQueue, SList};

use crate::event::{FifoWord, KeyAction, KeyEvent};
use crate::hal::{KeyscanHardware, MatrixConfig};

/// Depth of the hardware key event FIFO.
pub const HW_FIFO_SIZE: usize = 20;

/// Depth of the firmware event queue: two full hardware FIFO drains plus
/// slack for markers.
pub const FW_FIFO_SIZE: usize = 2 * HW_FIFO_SIZE + 6;

/// Maximum number of event-notification registrations.
pub const MAX_EVENT_LISTENERS: usize = 4;

/// Notification callback invoked after an interrupt service queues events.
///
/// Receives the token passed at registration; callbacks run in the context
/// that called [`KeyscanDriver::service_interrupt`], typically the scan
/// interrupt, and must behave accordingly.
pub type EventCallback = fn(token: u32);

/// One permanent notification registration.
#[derive(Clone, Copy)]
struct Registration {
    callback: EventCallback,
    token: u32,
}

/// Error returned when the registration chain is out of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationFull;

/// Matrix scan driver over a [`KeyscanHardware`] implementation.
pub struct KeyscanDriver<H: KeyscanHardware> {
    hw: H,
    config: MatrixConfig,
    queue: EventQueue<KeyEvent, FW_FIFO_SIZE>,
    listeners: SList<Registration, MAX_EVENT_LISTENERS>,
    /// Key-down events popped by the consumer not yet matched by key-ups.
    keys_pressed: u8,
    /// Raw scan-cycle flag of the sweep currently being queued.
    current_cycle: Option<bool>,
    scanning: bool,
}

impl<H: KeyscanHardware> KeyscanDriver<H> {
    /// Wrap the scan hardware. No registers are touched until
    /// [`init`](KeyscanDriver::init).
    pub fn new(hw: H, config: MatrixConfig) -> Self {
        Self {
            hw,
            config,
            queue: EventQueue::new(),
            listeners: SList::new(),
            keys_pressed: 0,
            current_cycle: None,
            scanning: false,
        }
    }

    /// Program the matrix geometry, reset the scan block and start scanning
    /// with ghost detection and the scan interrupt enabled.
    pub fn init(&mut self) -> Result<(), H::Error> {
        self.hw.configure(&self.config)?;
        self.hw.reset()?;
        self.hw.set_ghost_detection(true)?;
        self.hw.set_scan_enabled(true)?;
        self.hw.set_interrupt_enabled(true)?;
        self.scanning = true;
        Ok(())
    }

    /// Reset the scan hardware. Any queued events are thrown away and the
    /// pressed-key count is cleared.
    pub fn reset(&mut self) -> Result<(), H::Error> {
        self.hw.reset()?;
        self.queue.flush();
        self.keys_pressed = 0;
        self.current_cycle = None;
        Ok(())
    }

    /// `true` if key events are waiting in the firmware queue.
    pub fn events_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Pop the next key event, or `None` when the queue is empty.
    ///
    /// Maintains the pressed-key count: a consumed key-down increments it,
    /// a consumed key-up decrements it (saturating at zero). Marker events
    /// leave the count alone.
    pub fn next_event(&mut self) -> Option<KeyEvent> {
        let event = self.queue.pop()?;
        if event.is_matrix_key() {
            self.keys_pressed = match event.action {
                KeyAction::Down => self.keys_pressed.saturating_add(1),
                KeyAction::Up => self.keys_pressed.saturating_sub(1),
            };
        }
        Some(event)
    }

    /// Stop scanning and gate the interrupt. Queued events are preserved.
    pub fn turn_off(&mut self) -> Result<(), H::Error> {
        self.hw.set_interrupt_enabled(false)?;
        self.hw.set_scan_enabled(false)?;
        self.scanning = false;
        Ok(())
    }

    /// Resume scanning after [`turn_off`](KeyscanDriver::turn_off).
    pub fn turn_on(&mut self) -> Result<(), H::Error> {
        self.hw.set_scan_enabled(true)?;
        self.hw.set_interrupt_enabled(true)?;
        self.scanning = true;
        Ok(())
    }

    /// `true` while scanning is enabled.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Enable or disable in-hardware ghost detection.
    pub fn enable_ghost_detection(&mut self, enabled: bool) -> Result<(), H::Error> {
        self.hw.set_ghost_detection(enabled)
    }

    /// Ungate the scan interrupt.
    pub fn enable_interrupt(&mut self) -> Result<(), H::Error> {
        self.hw.set_interrupt_enabled(true)
    }

    /// Gate the scan interrupt.
    pub fn disable_interrupt(&mut self) -> Result<(), H::Error> {
        self.hw.set_interrupt_enabled(false)
    }

    /// Number of keys currently held, as observed by the consumer.
    pub fn keys_pressed_count(&self) -> u8 {
        self.keys_pressed
    }

    /// Zero the pressed-key count (after a reset initiated elsewhere).
    pub fn clear_keys_pressed_count(&mut self) {
        self.keys_pressed = 0;
    }

    /// Register for notification after interrupt services that queue events.
    ///
    /// Registration is permanent: there is no unregister, registration is
    /// meant to be a startup activity. The callback runs once per serviced
    /// interrupt, in interrupt context, with `token` passed back as-is.
    pub fn register_listener(
        &mut self,
        callback: EventCallback,
        token: u32,
    ) -> Result<(), RegistrationFull> {
        self.listeners
            .push_back(Registration { callback, token })
            .map(|_| ())
            .map_err(|_| RegistrationFull)
    }

    /// Drain and discard the hardware FIFO without queueing anything.
    pub fn flush_hw_events(&mut self) {
        while self.hw.read_fifo_word().is_some() {}
        self.hw.clear_interrupt();
    }

    /// Service the scan interrupt: drain the hardware FIFO into the
    /// firmware queue, applying ghost rollback and overflow marking.
    ///
    /// Returns the number of events pending after the drain. Safe to call
    /// with an empty FIFO (a no-op that still acknowledges the interrupt).
    pub fn service_interrupt(&mut self) -> usize {
        let mut queued_any = false;
        while let Some(word) = self.hw.read_fifo_word() {
            match FifoWord::decode(word) {
                FifoWord::InitFiller => {}
                FifoWord::Ghost { scan_cycle } => {
                    self.begin_cycle_if_new(scan_cycle);
                    self.queue.rollback_to_mark();
                    queued_any |= self.enqueue(KeyEvent::rollover(scan_cycle));
                }
                FifoWord::Event(event) => {
                    self.begin_cycle_if_new(event.scan_cycle);
                    queued_any |= self.enqueue(event);
                }
            }
        }
        self.hw.clear_interrupt();
        if queued_any {
            self.notify_listeners();
        }
        self.queue.len()
    }

    /// Resolve when the scan interrupt fires.
    pub async fn wait_for_interrupt(&mut self) {
        self.hw.wait_for_interrupt().await;
    }

    /// Matrix geometry the driver was built with.
    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Shared access to the hardware (mock inspection in tests).
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Exclusive access to the hardware.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Place the rollback mark when `scan_cycle` starts a new sweep.
    ///
    /// The mark must sit before the sweep's first queued event so a ghost
    /// can retract exactly this sweep.
    fn begin_cycle_if_new(&mut self, scan_cycle: bool) {
        if self.current_cycle != Some(scan_cycle) {
            self.current_cycle = Some(scan_cycle);
            self.queue.mark_rollback();
        }
    }

    /// Queue `event`, falling back to a rollover marker in the reserved
    /// slot when the queue is full. Returns `true` if anything was queued.
    fn enqueue(&mut self, event: KeyEvent) -> bool {
        if self.queue.push(event).is_ok() {
            return true;
        }
        match self.queue.push_overflow(KeyEvent::rollover(event.scan_cycle)) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("key event queue overflow, queued rollover");
                true
            }
            // Reserved slot already holds a rollover: the loss is recorded.
            Err(_) => false,
        }
    }

    fn notify_listeners(&self) {
        for registration in &self.listeners {
            (registration.callback)(registration.token);
        }
    }
}

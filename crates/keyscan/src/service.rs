//! Embassy plumbing between the scan interrupt and the application.
//!
//! # Architecture
//!
//! A single static [`Channel`] carries events from the scan service loop to
//! the application. [`KeyscanReader`] wraps the channel receiver; [`run`]
//! owns the driver and pumps it forever.
//!
//! # Overflow handling
//!
//! Events are forwarded with a non-blocking `try_send`. If the consumer
//! stalls and the channel reaches capacity, events are dropped rather than
//! blocking the scan path indefinitely; the compile-time constant
//! [`CHANNEL_DEPTH`] controls how many events may queue before drops begin.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::driver::KeyscanDriver;
use crate::event::KeyEvent;
use crate::hal::KeyscanHardware;

/// Depth of the event channel.
pub const CHANNEL_DEPTH: usize = 16;

/// Channel type carrying decoded key events to the application.
pub type KeyEventChannel = Channel<CriticalSectionRawMutex, KeyEvent, CHANNEL_DEPTH>;

// CriticalSectionRawMutex: the channel is written from the scan service
// (interrupt-adjacent) and read from thread-mode tasks; on single-core
// Cortex-M the critical section lasts tens of nanoseconds per operation.
/// Global event channel shared between the scan service and the application.
pub static KEY_EVENT_CHANNEL: KeyEventChannel = Channel::new();

/// Consumer handle over [`KEY_EVENT_CHANNEL`].
pub struct KeyscanReader {
    rx: Receiver<'static, CriticalSectionRawMutex, KeyEvent, CHANNEL_DEPTH>,
}

impl KeyscanReader {
    /// Create a reader backed by the static channel.
    pub fn new() -> Self {
        Self {
            rx: KEY_EVENT_CHANNEL.receiver(),
        }
    }

    /// Wait for the next key event (async, power-efficient).
    pub async fn next(&mut self) -> KeyEvent {
        self.rx.receive().await
    }

    /// Poll for an event without blocking.
    pub fn poll(&mut self) -> Option<KeyEvent> {
        self.rx.try_receive().ok()
    }
}

impl Default for KeyscanReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempt to forward a [`KeyEvent`] without blocking.
///
/// Returns `true` if the event was enqueued, `false` if the channel was
/// full and the event was dropped. Blocking here is not an option: a slow
/// consumer must never stall the scan service loop.
pub fn try_send_event(
    tx: &Sender<'_, CriticalSectionRawMutex, KeyEvent, CHANNEL_DEPTH>,
    event: KeyEvent,
) -> bool {
    tx.try_send(event).is_ok()
}

/// Scan service loop: wait for the interrupt, service the driver, forward
/// every queued event to `channel`.
///
/// Pass [`KEY_EVENT_CHANNEL`] in firmware; tests pass their own channel so
/// runs stay isolated. The loop never returns; spawn it as a task.
pub async fn run<H: KeyscanHardware>(
    driver: &mut KeyscanDriver<H>,
    channel: &KeyEventChannel,
) -> ! {
    let tx = channel.sender();
    loop {
        driver.wait_for_interrupt().await;
        if driver.service_interrupt() == 0 {
            continue;
        }
        while let Some(event) = driver.next_event() {
            if !try_send_event(&tx, event) {
                #[cfg(feature = "defmt")]
                defmt::warn!("key event channel full, dropped key {=u8}", event.key_code);
            }
        }
    }
}

//! Application-context call serialization.
//!
//! Driver and interrupt code must not run application logic in place; it
//! hands the work over instead. [`Dispatcher`] queues small call records
//! (a function pointer plus a `u32` argument) from any context; the
//! application task executes them in FIFO order, each exactly once, via
//! [`process_one`], [`process_pending`] or the async [`run`] loop.
//!
//! Serialization failures are rare but painful to debug after the fact, so
//! the dispatcher keeps a bounded history of the most recent failure codes
//! and can report each failure through a registered debug callback as it
//! happens.
//!
//! ```no_run
//! use dispatch::Dispatcher;
//!
//! static DISPATCHER: Dispatcher<16> = Dispatcher::new();
//!
//! fn on_key_event(token: u32) {
//!     // interrupt context: defer to the application task
//!     let _ = DISPATCHER.serialize_call(handle_key_event, token);
//! }
//!
//! fn handle_key_event(token: u32) {
//!     // application context
//!     let _ = token;
//! }
//! ```
//!
//! [`process_one`]: Dispatcher::process_one
//! [`process_pending`]: Dispatcher::process_pending
//! [`run`]: Dispatcher::run

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)] // DispatchError variants say it all

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use thiserror_no_std::Error;

/// Number of failure codes retained.
///
/// This value is fixed by the wire-debug tooling and is not permitted to
/// change.
pub const FAILURE_HISTORY_SIZE: usize = 5;

/// Function executed in application context.
pub type AppCallFn = fn(u32);

/// One serialized call: the function to invoke and its argument.
#[derive(Clone, Copy)]
struct AppCall {
    handler: AppCallFn,
    arg: u32,
}

/// Why a call could not be serialized.
///
/// Each variant keeps the failure code recorded in the history; code `0x00`
/// is the "no failure" default and is never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// [`Dispatcher::init`] has not been called yet.
    #[error("dispatcher not initialized")]
    NotInitialized,
    /// The call queue is full.
    #[error("call queue full")]
    QueueFull,
}

impl DispatchError {
    /// Failure code recorded in the history.
    pub const fn code(self) -> u8 {
        match self {
            Self::NotInitialized => 0x10,
            Self::QueueFull => 0x21,
        }
    }
}

/// Ring of the most recent failure codes, newest overwriting oldest.
struct FailureHistory {
    codes: [u8; FAILURE_HISTORY_SIZE],
    next: usize,
}

impl FailureHistory {
    const fn new() -> Self {
        Self {
            codes: [0; FAILURE_HISTORY_SIZE],
            next: 0,
        }
    }

    #[allow(clippy::indexing_slicing)] // Safety: next < FAILURE_HISTORY_SIZE invariant
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via % FAILURE_HISTORY_SIZE
    fn record(&mut self, code: u8) {
        self.codes[self.next] = code;
        self.next = (self.next + 1) % FAILURE_HISTORY_SIZE;
    }

    /// Most-recent-first snapshot; unused slots hold `0x00`.
    #[allow(clippy::indexing_slicing)] // Safety: indices reduced mod FAILURE_HISTORY_SIZE
    #[allow(clippy::arithmetic_side_effects)] // Safety: bounded ring arithmetic
    fn snapshot(&self) -> [u8; FAILURE_HISTORY_SIZE] {
        let mut out = [0; FAILURE_HISTORY_SIZE];
        for (i, slot) in out.iter_mut().enumerate() {
            let idx = (self.next + FAILURE_HISTORY_SIZE - 1 - i) % FAILURE_HISTORY_SIZE;
            *slot = self.codes[idx];
        }
        out
    }
}

/// Shared mutable bookkeeping behind a blocking mutex.
struct DebugState {
    history: FailureHistory,
    debug_callback: Option<fn(DispatchError)>,
}

/// Serializes calls onto the application task.
///
/// `N` is the call-queue depth. The dispatcher is usually a `static`;
/// every method takes `&self` so producers in interrupt context and the
/// consumer task can share it freely.
pub struct Dispatcher<const N: usize> {
    queue: Channel<CriticalSectionRawMutex, AppCall, N>,
    state: Mutex<CriticalSectionRawMutex, RefCell<DebugState>>,
    initialized: AtomicBool,
}

impl<const N: usize> Dispatcher<N> {
    /// Create an idle dispatcher. Calls are refused until
    /// [`init`](Dispatcher::init) runs.
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            state: Mutex::new(RefCell::new(DebugState {
                history: FailureHistory::new(),
                debug_callback: None,
            })),
            initialized: AtomicBool::new(false),
        }
    }

    /// Arm the dispatcher. Called once during startup, after the
    /// application task that will drain the queue exists.
    pub fn init(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// `true` once [`init`](Dispatcher::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Serialize a call onto the application task.
    ///
    /// May be called from any context; never blocks. On failure the code is
    /// recorded in the history, the debug callback (if any) fires, and the
    /// error is returned.
    pub fn serialize_call(&self, handler: AppCallFn, arg: u32) -> Result<(), DispatchError> {
        if !self.is_initialized() {
            self.record_failure(DispatchError::NotInitialized);
            return Err(DispatchError::NotInitialized);
        }
        match self.queue.try_send(AppCall { handler, arg }) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.record_failure(DispatchError::QueueFull);
                Err(DispatchError::QueueFull)
            }
        }
    }

    /// Execute the oldest queued call, if any. Returns `true` when a call
    /// ran.
    pub fn process_one(&self) -> bool {
        match self.queue.try_receive() {
            Ok(call) => {
                (call.handler)(call.arg);
                true
            }
            Err(_) => false,
        }
    }

    /// Execute every queued call; returns how many ran.
    pub fn process_pending(&self) -> usize {
        let mut ran: usize = 0;
        while self.process_one() {
            ran = ran.saturating_add(1);
        }
        ran
    }

    /// Application task main loop: execute calls as they arrive, forever.
    pub async fn run(&self) -> ! {
        loop {
            let call = self.queue.receive().await;
            (call.handler)(call.arg);
        }
    }

    /// Register the debug callback fired on each recorded failure.
    ///
    /// Meant for bring-up and field diagnostics; the callback runs in the
    /// context that attempted the serialization.
    pub fn register_debug_callback(&self, callback: fn(DispatchError)) {
        self.state.lock(|state| {
            state.borrow_mut().debug_callback = Some(callback);
        });
    }

    /// Most-recent-first snapshot of failure codes; `0x00` marks unused
    /// slots and is never a real code.
    pub fn failure_history(&self) -> [u8; FAILURE_HISTORY_SIZE] {
        self.state.lock(|state| state.borrow().history.snapshot())
    }

    /// Record a failure and fire the debug callback outside the lock.
    fn record_failure(&self, error: DispatchError) {
        let callback = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.history.record(error.code());
            state.debug_callback
        });
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

impl<const N: usize> Default for Dispatcher<N> {
    fn default() -> Self {
        Self::new()
    }
}

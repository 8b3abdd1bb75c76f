//! Stuck-key supervision.
//!
//! A key held longer than the configured timeout usually means the device
//! is wedged in a bag or a key cap is jammed; firmware uses the transition
//! to `Stuck` to stop treating the matrix as user activity and allow deep
//! sleep.
//!
//! The monitor is a pure state machine fed by periodic calls to
//! [`on_tick`]; it takes the current time as a parameter so host tests can
//! drive it without a time driver.
//!
//! [`on_tick`]: StuckKeyMonitor::on_tick

use embassy_time::{Duration, Instant};

/// Default hold time after which a key counts as stuck.
pub const DEFAULT_STUCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Supervision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StuckKeyState {
    /// No observation yet.
    Init,
    /// Keys are idle or changing normally.
    Normal,
    /// At least one key has been held past the timeout.
    Stuck,
}

/// Detects keys held past a timeout.
pub struct StuckKeyMonitor {
    state: StuckKeyState,
    timeout: Duration,
    /// Start of the current unchanged-hold period.
    held_since: Option<Instant>,
    last_pressed: u8,
    callback: Option<fn()>,
}

impl StuckKeyMonitor {
    /// Create a monitor with the default timeout.
    pub const fn new() -> Self {
        Self {
            state: StuckKeyState::Init,
            timeout: DEFAULT_STUCK_TIMEOUT,
            held_since: None,
            last_pressed: 0,
            callback: None,
        }
    }

    /// Change the hold timeout at runtime.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Register a callback fired once on each transition into `Stuck`.
    pub fn on_stuck(&mut self, callback: fn()) {
        self.callback = Some(callback);
    }

    /// Feed an observation: the current time and the driver's pressed-key
    /// count.
    ///
    /// Any change in the pressed count restarts the hold period and returns
    /// the state to `Normal`; a count held unchanged and non-zero past the
    /// timeout transitions to `Stuck` and fires the callback.
    pub fn on_tick(&mut self, now: Instant, keys_pressed: u8) {
        if keys_pressed == 0 {
            self.state = StuckKeyState::Normal;
            self.held_since = None;
        } else if keys_pressed != self.last_pressed || self.held_since.is_none() {
            self.state = StuckKeyState::Normal;
            self.held_since = Some(now);
        } else if self.state != StuckKeyState::Stuck {
            if let Some(since) = self.held_since {
                let held = now
                    .checked_duration_since(since)
                    .unwrap_or(Duration::from_ticks(0));
                if held >= self.timeout {
                    self.state = StuckKeyState::Stuck;
                    if let Some(callback) = self.callback {
                        callback();
                    }
                }
            }
        }
        self.last_pressed = keys_pressed;
    }

    /// Current supervision state.
    pub fn state(&self) -> StuckKeyState {
        self.state
    }

    /// `true` while a key is considered stuck.
    pub fn is_key_stuck(&self) -> bool {
        self.state == StuckKeyState::Stuck
    }
}

impl Default for StuckKeyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

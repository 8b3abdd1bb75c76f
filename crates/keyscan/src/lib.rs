//! Key-matrix scan driver for the controller firmware.
//!
//! The scan hardware sweeps the key matrix and reports transitions as 32-bit
//! words in a small FIFO. This crate turns that FIFO into a clean stream of
//! [`KeyEvent`]s for the application:
//!
//! ```text
//! Application task
//!         ↓ (embassy channel, service module)
//! KeyscanDriver (this crate - firmware FIFO, ghost rollback, listeners)
//!         ↓ (KeyscanHardware trait)
//! Scan hardware (registers + interrupt)
//! ```
//!
//! # Modules
//!
//! - [`event`] - event model and raw FIFO word codec
//! - [`hal`] - the [`KeyscanHardware`] trait and validated [`MatrixConfig`]
//! - [`driver`] - the [`KeyscanDriver`] state machine
//! - [`service`] - Embassy channel pump and [`KeyscanReader`]
//! - [`stuck`] - stuck-key supervision (feature `stuck-key`)
//! - [`mocks`] - scripted hardware for host tests (feature `std` or tests)
//!
//! # Features
//!
//! - `std`: compile the mock hardware for host-side consumers
//! - `stuck-key`: stuck-key supervision (pulls in `embassy-time`)
//! - `defmt`: enable defmt derives and log statements

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
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::missing_errors_doc)] // errors are forwarded HAL errors
#![allow(async_fn_in_trait)] // single-threaded executor, Send bounds not needed

pub mod driver;
pub mod event;
pub mod hal;
pub mod service;

#[cfg(feature = "stuck-key")]
pub mod stuck;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use driver::{KeyscanDriver, EventCallback, RegistrationFull, FW_FIFO_SIZE, HW_FIFO_SIZE};
pub use event::{FifoWord, KeyAction, KeyEvent};
pub use hal::{ConfigError, KeyscanHardware, MatrixConfig, MAX_COLS, MAX_ROWS};
pub use service::{KeyscanReader, CHANNEL_DEPTH, KEY_EVENT_CHANNEL};

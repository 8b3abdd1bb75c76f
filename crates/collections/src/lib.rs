//! Allocation-free data structures for the key-matrix controller firmware.
//!
//! Two structures live here, both `no_std` and fixed-capacity:
//!
//! - [`EventQueue`] - a circular FIFO with a reserved overflow slot and
//!   producer-side rollback, used as the firmware-side key event queue
//!   between the scan interrupt and the application.
//! - [`SList`] - a singly-linked list kept in an index-linked arena, with the
//!   tail-pointer circular representation that makes insertion at both ends
//!   O(1). Used for permanent registration chains.
//!
//! Neither structure allocates, locks, or depends on an executor; callers
//! that share one across contexts wrap it in a mutex appropriate to their
//! platform.
//!
//! # Features
//!
//! - `defmt`: derive `defmt::Format` on the public types

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
#![allow(clippy::must_use_candidate)] // container accessors, callers decide
#![allow(clippy::missing_errors_doc)] // the unit error types say it all

pub mod event_queue;
pub mod slist;

pub use event_queue::{EventQueue, QueueFull};
pub use slist::{ListError, NodeId, SList};

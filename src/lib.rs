//! Rotary encoder state for no-std, interrupt-driven targets.
//!
//! # Highlights
//! - Lock-free bridge from interrupt handlers to a single cooperative task.
//! - Bounded `i16` knob per encoder, clamping or wrapping at its limits.
//! - Push-switch toggle state and read-and-clear event/alert latches.
//! - No allocation, no dynamic dispatch, fixed compile-time capacity.
//!
//! # Quick start
//! ```
//! use knob_bridge::{EncoderBridge, Signal};
//!
//! static ENCODERS: EncoderBridge<4> = EncoderBridge::new();
//!
//! let mut knobs = ENCODERS.consumer().unwrap();
//! knobs.init(0, 0, 10, true, true);
//!
//! // From the GPIO interrupt handler:
//! ENCODERS.producer().signal(0, Signal::Clockwise);
//!
//! // From the main loop:
//! knobs.run_pending();
//! if knobs.check_event(0) {
//!     assert_eq!(knobs.knob(0), 1);
//! }
//! ```
//!
//! # No-std
//! The crate is `#![no_std]` by default. Tests require `std`.
//!
//! # Safety and concurrency
//! Any number of interrupt handlers may hold a [`Producer`]; exactly one [`Consumer`]
//! exists at a time and [`EncoderBridge::consumer`] returns `None` while it is alive.
//! Encoder records are owned by the consumer and never touched from interrupt context.
//!
//! # Semantics
//! - Handles are `0..N`; an out-of-range or uninitialized handle is a no-op returning
//!   `false` (mutators) or `0`/`false` (accessors). `try_*` variants report why.
//! - `run_pending` applies clockwise steps, then counter-clockwise steps, then presses.
//! - `check_event` and `check_alert` read and clear their latch.
//! - Debounce and quadrature decoding are the integrator's job; each signal is one
//!   resolved edge.
#![no_std]

pub mod bounds;
pub mod bridge;
pub mod config;
pub mod error;
pub mod store;

pub use bridge::{Consumer, DrainStats, EncoderBridge, Producer, Signal};
pub use config::{DEFAULT_INSTANCES, EdgePolicy, EncoderConfig, MAX_INSTANCES};
pub use error::EncoderError;
pub use store::{EncoderState, InstanceStore};

#[cfg(test)]
extern crate std;

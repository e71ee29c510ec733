//! Frontend core for a handheld emulator host.
//!
//! This crate contains the host-side logic that sits between an emulation
//! engine and whatever owns the display: frame pacing, savestate slot
//! management and framebuffer scaling. Frontends (the headless UI crate, or a
//! windowed one) drive it through the [`session`] facade.

/// Adaptive frame-skip regulator.
pub mod cadence;

/// Engine and presentation traits the host plugs into the core.
pub mod engine;

/// Error types surfaced by snapshot and battery I/O.
pub mod error;

/// Storage roots and file naming for states, batteries and screenshots.
pub mod paths;

/// Nearest-neighbor framebuffer scaling.
pub mod scaler;

/// Session context wiring the store, cadence and save-key handling together.
pub mod session;

/// Savestate slot identifiers.
pub mod slot;

/// Transient on-screen messages and speed readouts.
pub mod status;

/// Slot read/write and the backup-and-exchange protocol.
pub mod store;

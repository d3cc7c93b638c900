//! # switchdeck-core
//!
//! Shared library for switchdeck containing the mapping-table schema, the
//! controller event model, the switcher command set, and the pure functions
//! that derive LED feedback from switcher state.
//!
//! This crate has zero dependencies on MIDI drivers, network sockets, or async
//! runtimes.  Everything here can be unit-tested without hardware.
//!
//! # Architecture overview
//!
//! switchdeck sits between a MIDI control surface and a live video switcher:
//!
//! ```text
//! MIDI controller ──ControllerEvent──▶ translator ──DeviceCommand──▶ switcher
//!        ▲                                                             │
//!        └──────LedFeedback────── synchronizer ◀──DeviceState─────────┘
//!                                      │
//!                                      └──ObserverMessage──▶ browsers
//! ```
//!
//! - **`domain::mapping`** – The declarative rules that bind a note or
//!   control-change number to a switcher action.
//! - **`domain::events`** – Controller input events and decoding from raw MIDI.
//! - **`domain::command`** – The closed set of commands a switcher accepts,
//!   plus the value-scaling functions that map 7-bit controller values onto
//!   switcher ranges.
//! - **`domain::state`** – The switcher state snapshot the core reads.
//! - **`domain::feedback`** – LED colours, the note-on wire format, and the
//!   browser-facing observer message.

pub mod domain;

pub use domain::command::{DeviceCommand, DveAxis};
pub use domain::events::ControllerEvent;
pub use domain::feedback::{derive_led_feedback, LedColor, LedFeedback, ObserverMessage};
pub use domain::mapping::{IgnoredKey, MappingEntry, MappingError, MappingTable};
pub use domain::state::{DeviceState, MixEffectState};

//! Domain entities for switchdeck.
//!
//! Pure types and functions with no I/O.  The application layer in
//! `switchdeck-bridge` composes these with the gateway adapters.

/// Mapping table: controller input identifiers → switcher actions.
pub mod mapping;

/// Controller input events and raw MIDI decoding.
pub mod events;

/// Switcher command set and controller-value scaling.
pub mod command;

/// Switcher state snapshot.
pub mod state;

/// LED feedback and observer messages derived from switcher state.
pub mod feedback;

//! Infrastructure layer for switchdeck-bridge.
//!
//! Contains the outward-facing adapters: MIDI ports, the switcher
//! connection, the observer WebSocket server, the HTTP server, and mapping
//! file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `switchdeck_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod controller;
pub mod device;
pub mod http;
pub mod observers;
pub mod storage;

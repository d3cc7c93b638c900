//! switchdeck-bridge library crate.
//!
//! Connects a MIDI control surface to a live video switcher and mirrors the
//! switcher's program/preview state back to the surface LEDs and to browsers.
//!
//! # Architecture
//!
//! ```text
//! MIDI surface ──▶ [controller gateway] ──ControllerEvent──┐
//!                                                          ▼
//!                                               application::dispatch
//!                                          (single consumer, run to completion)
//!                                            │                      ▲
//!                        EventTranslator ────┘                      │ DeviceEvent
//!                              │ DeviceCommand                      │
//!                              ▼                                    │
//!                       [device gateway] ──────────────────────────┘
//!                                                          │
//!                        FeedbackSynchronizer ◀────────────┘
//!                          ├──▶ LED note-on ──▶ [controller gateway]
//!                          └──▶ deviceUpdate ──▶ [observer broadcast] ──▶ browsers
//! ```
//!
//! # Layer rules
//!
//! - `domain` holds runtime configuration only; the switching domain lives in
//!   `switchdeck-core`.
//! - `application` depends on `domain`, `switchdeck-core`, and the gateway
//!   traits it defines in `application::ports`.  No sockets, no MIDI driver.
//! - `infrastructure` implements those traits (midir, simulated switcher,
//!   WebSocket and HTTP servers, mapping file storage).

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: translation, feedback, and the dispatch loop.
pub mod application;

/// Infrastructure layer: gateway adapters and servers.
pub mod infrastructure;

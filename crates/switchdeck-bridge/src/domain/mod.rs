//! Domain layer for switchdeck-bridge.
//!
//! Only the runtime configuration lives here.  It is a plain struct with no
//! environment reads; `main.rs` fills it from CLI arguments.

pub mod config;

pub use config::{BridgeConfig, CutBehavior};

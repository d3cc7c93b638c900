//! Switcher gateways.
//!
//! The bridge talks to the switcher only through the
//! [`DeviceGateway`](crate::application::ports::DeviceGateway) trait.  The
//! shipped implementation is [`SimulatedSwitcher`], an in-process model of a
//! single mix-effect production switcher that applies every command to its
//! own state and reports changes the way a networked switcher would.

pub mod simulated;

pub use simulated::SimulatedSwitcher;

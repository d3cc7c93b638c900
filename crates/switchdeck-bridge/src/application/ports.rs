//! Gateway traits: the seams between the application layer and the outside
//! world.
//!
//! Infrastructure provides the production implementations (simulated
//! switcher, midir output, WebSocket broadcast); tests provide recording or
//! mocked ones.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

use switchdeck_core::{DeviceCommand, DeviceState, ObserverMessage};

/// Failures reported by a device gateway.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("switcher at {address} is unreachable: {reason}")]
    Unreachable { address: SocketAddr, reason: String },

    #[error("switcher is not connected")]
    NotConnected,

    #[error("switcher rejected {command}: {reason}")]
    Rejected { command: String, reason: String },
}

/// Failures reported by the controller gateway.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("MIDI driver initialisation failed: {0}")]
    Init(String),

    #[error("MIDI port index {index} is out of range ({available} ports available)")]
    PortOutOfRange { index: usize, available: usize },

    #[error("failed to open MIDI port {index}: {reason}")]
    Open { index: usize, reason: String },

    #[error("failed to send MIDI message: {0}")]
    Send(String),
}

/// Notifications from the device gateway.
///
/// `StateChanged` carries no payload: consumers re-read
/// [`DeviceGateway::current_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Connected { address: SocketAddr },
    StateChanged,
}

/// The switcher connection.
///
/// Implementations own the [`DeviceState`] and deliver [`DeviceEvent`]s on a
/// channel handed out at construction time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Opens the connection to the switcher at `address`.
    async fn connect(&self, address: SocketAddr) -> Result<(), DeviceError>;

    /// Sends one command to the switcher.
    async fn issue(&self, command: DeviceCommand) -> Result<(), DeviceError>;

    /// Returns a consistent snapshot of the switcher state, or `None` before
    /// the switcher has reported any.
    fn current_state(&self) -> Option<DeviceState>;
}

/// The output half of the control surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControllerOutput: Send + Sync {
    /// Sends one raw MIDI message to the surface.
    async fn send_output(&self, message: &[u8]) -> Result<(), ControllerError>;
}

/// Fan-out to browser observers.
///
/// Publishing never blocks; observers that cannot keep up are skipped.
pub trait ObserverSink: Send + Sync {
    /// Queues `message` for every connected observer and returns how many
    /// observers it was queued for.
    fn publish(&self, message: &ObserverMessage) -> usize;
}

//! Browser observer fan-out.
//!
//! [`ObserverBroadcast`] serializes each [`ObserverMessage`] once and hands
//! the JSON text to every subscribed WebSocket session through a Tokio
//! broadcast channel.  A session that falls more than the channel capacity
//! behind loses the oldest frames; publishing itself never waits.

use tokio::sync::broadcast;
use tracing::{debug, error};

use switchdeck_core::ObserverMessage;

use crate::application::ports::ObserverSink;

pub mod ws_server;

pub use ws_server::{run_observer_server, serve_observers};

/// Frames kept per lagging subscriber before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts observer frames to every connected browser.
#[derive(Clone)]
pub struct ObserverBroadcast {
    sender: broadcast::Sender<String>,
}

impl ObserverBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Number of observers currently subscribed.
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ObserverBroadcast {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ObserverSink for ObserverBroadcast {
    fn publish(&self, message: &ObserverMessage) -> usize {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to serialize observer message: {e}");
                return 0;
            }
        };
        match self.sender.send(frame) {
            Ok(count) => count,
            Err(_) => {
                debug!("no observers connected");
                0
            }
        }
    }
}

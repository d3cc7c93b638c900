//! In-memory control surface for tests and headless runs.
//!
//! Lets tests inject synthetic [`ControllerEvent`]s without a MIDI driver,
//! and records every message the bridge sends back for LED feedback.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use switchdeck_core::ControllerEvent;

use crate::application::ports::{ControllerError, ControllerOutput};

/// A control surface that lives entirely in memory.
pub struct MockSurface {
    sender: Mutex<Option<mpsc::Sender<ControllerEvent>>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockSurface {
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Opens the input side and returns its event channel.
    pub fn start(&self, capacity: usize) -> mpsc::Receiver<ControllerEvent> {
        let (tx, rx) = mpsc::channel(capacity);
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        rx
    }

    /// Closes the input side.
    pub fn stop(&self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }

    /// Injects an event as if the surface had sent it.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub async fn inject(&self, event: ControllerEvent) {
        let sender = self
            .sender
            .lock()
            .expect("lock poisoned")
            .clone()
            .expect("MockSurface::inject called before start()");
        sender
            .send(event)
            .await
            .expect("receiver has been dropped");
    }

    /// Every message sent to the surface so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().expect("lock poisoned").clear();
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControllerOutput for MockSurface {
    async fn send_output(&self, message: &[u8]) -> Result<(), ControllerError> {
        self.sent
            .lock()
            .map_err(|_| ControllerError::Send("lock poisoned".to_string()))?
            .push(message.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_surface_delivers_injected_events() {
        // Arrange
        let surface = MockSurface::new();
        let mut rx = surface.start(4);

        // Act
        surface
            .inject(ControllerEvent::Note {
                note: 36,
                velocity: 127,
            })
            .await;

        // Assert
        assert_eq!(
            rx.recv().await,
            Some(ControllerEvent::Note {
                note: 36,
                velocity: 127
            })
        );
    }

    #[tokio::test]
    async fn test_mock_surface_stop_closes_channel() {
        let surface = MockSurface::new();
        let mut rx = surface.start(1);
        surface.stop();
        assert_eq!(rx.recv().await, None, "channel should be closed after stop()");
    }

    #[tokio::test]
    async fn test_mock_surface_records_sent_messages() {
        let surface = MockSurface::new();
        surface.send_output(&[0x90, 10, 127]).await.unwrap();
        surface.send_output(&[0x90, 11, 0]).await.unwrap();
        assert_eq!(surface.sent(), vec![vec![0x90, 10, 127], vec![0x90, 11, 0]]);

        surface.clear_sent();
        assert!(surface.sent().is_empty());
    }
}

//! FeedbackSynchronizer: mirrors switcher state onto the surface and browsers.
//!
//! Runs once per state change.  The switcher state is read exactly once per
//! call so the LEDs and the observer frame describe the same snapshot.

use std::sync::Arc;

use tracing::{debug, warn};

use switchdeck_core::{derive_led_feedback, MappingTable, ObserverMessage};

use crate::application::ports::{ControllerOutput, DeviceGateway, ObserverSink};
use crate::application::translate_event::MIX_EFFECT;

/// What [`FeedbackSynchronizer::on_state_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Mix-effect 0 has not been reported; nothing was sent.
    DeviceNotReady,
    /// LED updates were sent and the observer frame was published.
    Synced {
        leds_sent: usize,
        leds_failed: usize,
        observers: usize,
    },
}

pub struct FeedbackSynchronizer {
    table: Arc<MappingTable>,
    device: Arc<dyn DeviceGateway>,
    controller: Arc<dyn ControllerOutput>,
    observers: Arc<dyn ObserverSink>,
}

impl FeedbackSynchronizer {
    pub fn new(
        table: Arc<MappingTable>,
        device: Arc<dyn DeviceGateway>,
        controller: Arc<dyn ControllerOutput>,
        observers: Arc<dyn ObserverSink>,
    ) -> Self {
        Self {
            table,
            device,
            controller,
            observers,
        }
    }

    /// Recomputes every program/preview LED and notifies observers.
    ///
    /// A failed LED write is logged and skipped; the remaining LEDs and the
    /// observer frame are still sent.
    pub async fn on_state_changed(&self) -> SyncOutcome {
        let me = self
            .device
            .current_state()
            .and_then(|state| state.mix_effect(MIX_EFFECT).cloned());
        let Some(me) = me else {
            debug!("state changed before mix-effect {MIX_EFFECT} was reported");
            return SyncOutcome::DeviceNotReady;
        };

        let leds = derive_led_feedback(&self.table, &me);
        let mut leds_sent = 0;
        let mut leds_failed = 0;
        for led in leds {
            match self.controller.send_output(&led.to_note_on()).await {
                Ok(()) => leds_sent += 1,
                Err(e) => {
                    warn!("LED update for note {} failed: {e}", led.note);
                    leds_failed += 1;
                }
            }
        }

        let observers = self.observers.publish(&ObserverMessage::device_update(&me));
        debug!(
            "synced program {} / preview {}: {leds_sent} LEDs, {observers} observers",
            me.program_input, me.preview_input
        );

        SyncOutcome::Synced {
            leds_sent,
            leds_failed,
            observers,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ControllerError, MockControllerOutput, MockDeviceGateway};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use switchdeck_core::{DeviceState, MappingEntry, MixEffectState};

    #[derive(Default)]
    struct RecordingObservers {
        published: Mutex<Vec<ObserverMessage>>,
    }

    impl ObserverSink for RecordingObservers {
        fn publish(&self, message: &ObserverMessage) -> usize {
            self.published.lock().unwrap().push(message.clone());
            1
        }
    }

    fn table() -> Arc<MappingTable> {
        Arc::new(MappingTable {
            note_mappings: BTreeMap::from([
                (10, MappingEntry::Program { input: 3 }),
                (11, MappingEntry::Program { input: 4 }),
                (20, MappingEntry::Preview { input: 1 }),
                (30, MappingEntry::Cut),
            ]),
            control_change_mappings: None,
        })
    }

    fn device_with(program: u16, preview: u16) -> MockDeviceGateway {
        let mut device = MockDeviceGateway::new();
        device.expect_current_state().times(1).returning(move || {
            Some(DeviceState {
                mix_effects: vec![MixEffectState {
                    program_input: program,
                    preview_input: preview,
                    ..MixEffectState::default()
                }],
                ..DeviceState::default()
            })
        });
        device
    }

    #[tokio::test]
    async fn test_sends_led_per_program_and_preview_button() {
        // Arrange
        let sent = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let sent_clone = Arc::clone(&sent);
        let mut controller = MockControllerOutput::new();
        controller.expect_send_output().returning(move |msg| {
            sent_clone.lock().unwrap().push(msg.to_vec());
            Ok(())
        });
        let observers = Arc::new(RecordingObservers::default());
        let sync = FeedbackSynchronizer::new(
            table(),
            Arc::new(device_with(3, 1)),
            Arc::new(controller),
            Arc::clone(&observers) as Arc<dyn ObserverSink>,
        );

        // Act
        let outcome = sync.on_state_changed().await;

        // Assert
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                leds_sent: 3,
                leds_failed: 0,
                observers: 1
            }
        );
        assert_eq!(
            *sent.lock().unwrap(),
            vec![vec![0x90, 10, 127], vec![0x90, 11, 0], vec![0x90, 20, 100]]
        );
        assert_eq!(
            *observers.published.lock().unwrap(),
            vec![ObserverMessage::DeviceUpdate {
                program: 3,
                preview: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_unready_state_sends_nothing() {
        // Arrange
        let mut device = MockDeviceGateway::new();
        device.expect_current_state().returning(|| None);
        let mut controller = MockControllerOutput::new();
        controller.expect_send_output().never();
        let observers = Arc::new(RecordingObservers::default());
        let sync = FeedbackSynchronizer::new(
            table(),
            Arc::new(device),
            Arc::new(controller),
            Arc::clone(&observers) as Arc<dyn ObserverSink>,
        );

        // Act
        let outcome = sync.on_state_changed().await;

        // Assert
        assert_eq!(outcome, SyncOutcome::DeviceNotReady);
        assert!(observers.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_state_without_mix_effect_zero_sends_nothing() {
        let mut device = MockDeviceGateway::new();
        device
            .expect_current_state()
            .returning(|| Some(DeviceState::default()));
        let mut controller = MockControllerOutput::new();
        controller.expect_send_output().never();
        let sync = FeedbackSynchronizer::new(
            table(),
            Arc::new(device),
            Arc::new(controller),
            Arc::new(RecordingObservers::default()),
        );

        assert_eq!(sync.on_state_changed().await, SyncOutcome::DeviceNotReady);
    }

    #[tokio::test]
    async fn test_failed_led_write_is_skipped_and_observers_still_notified() {
        // Arrange: the first LED write fails.
        let mut controller = MockControllerOutput::new();
        controller
            .expect_send_output()
            .withf(|msg: &[u8]| msg[1] == 10)
            .times(1)
            .returning(|_| Err(ControllerError::Send("port closed".to_string())));
        controller
            .expect_send_output()
            .withf(|msg: &[u8]| msg[1] != 10)
            .times(2)
            .returning(|_| Ok(()));
        let observers = Arc::new(RecordingObservers::default());
        let sync = FeedbackSynchronizer::new(
            table(),
            Arc::new(device_with(3, 1)),
            Arc::new(controller),
            Arc::clone(&observers) as Arc<dyn ObserverSink>,
        );

        // Act
        let outcome = sync.on_state_changed().await;

        // Assert
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                leds_sent: 2,
                leds_failed: 1,
                observers: 1
            }
        );
        assert_eq!(observers.published.lock().unwrap().len(), 1);
    }
}

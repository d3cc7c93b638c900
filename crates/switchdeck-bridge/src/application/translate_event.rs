//! EventTranslator: turns controller events into switcher commands.
//!
//! This is the inbound half of the bridge.  Each controller event is looked up
//! in the mapping table and dispatched on the entry's action.  Lookup misses,
//! unknown actions, and an unready switcher are expected conditions: they are
//! logged and absorbed, never returned as errors.  A command the switcher
//! rejects is logged and the rest of the sequence is still attempted.

use std::sync::Arc;

use tracing::{debug, info, warn};

use switchdeck_core::domain::command::{
    audio_gain_db, dve_position, transition_position, transition_rate_frames,
};
use switchdeck_core::domain::events::MAX_VALUE;
use switchdeck_core::{ControllerEvent, DeviceCommand, DveAxis, MappingEntry, MappingTable};

use crate::application::ports::DeviceGateway;
use crate::domain::CutBehavior;

/// The mix-effect bank the surface drives.
pub const MIX_EFFECT: u8 = 0;

/// The upstream keyer the DVE knobs move.
const DVE_KEYER: u8 = 0;

/// What [`EventTranslator::handle`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A note release; no lookup was made.
    Released,
    /// No entry is bound to the input.
    Unmapped,
    /// The bound action is unknown, or not valid for this kind of input.
    UnknownAction,
    /// The action needs switcher state that has not arrived yet.
    DeviceNotReady,
    /// Commands were sent; `failed` of them were rejected by the gateway.
    Issued { attempted: usize, failed: usize },
}

/// Translates controller events into switcher commands.
pub struct EventTranslator {
    table: Arc<MappingTable>,
    device: Arc<dyn DeviceGateway>,
    cut_behavior: CutBehavior,
}

impl EventTranslator {
    pub fn new(
        table: Arc<MappingTable>,
        device: Arc<dyn DeviceGateway>,
        cut_behavior: CutBehavior,
    ) -> Self {
        Self {
            table,
            device,
            cut_behavior,
        }
    }

    /// Handles one controller event to completion.
    pub async fn handle(&self, event: ControllerEvent) -> HandleOutcome {
        match event {
            ControllerEvent::Note { note, velocity } => self.handle_note(note, velocity).await,
            ControllerEvent::ControlChange { controller, value } => {
                self.handle_control_change(controller, value).await
            }
        }
    }

    // ── Private event handlers ────────────────────────────────────────────────

    async fn handle_note(&self, note: u8, velocity: u8) -> HandleOutcome {
        if velocity == 0 {
            debug!("note {note} released");
            return HandleOutcome::Released;
        }

        let Some(entry) = self.table.note(note) else {
            info!("no mapping for note {note}");
            return HandleOutcome::Unmapped;
        };

        info!(
            "note {note} pressed with velocity {velocity}, mapped to '{}'",
            entry.action_name()
        );

        let commands = match entry {
            MappingEntry::Program { input } => vec![DeviceCommand::SetProgramInput {
                mix_effect: MIX_EFFECT,
                input: *input,
            }],
            MappingEntry::Preview { input } => vec![DeviceCommand::SetPreviewInput {
                mix_effect: MIX_EFFECT,
                input: *input,
            }],
            MappingEntry::Macro { macro_index } => vec![DeviceCommand::RunMacro {
                macro_index: *macro_index,
            }],
            MappingEntry::Cut => match self.cut_behavior {
                CutBehavior::CutOnly => vec![DeviceCommand::Cut {
                    mix_effect: MIX_EFFECT,
                }],
                CutBehavior::CutThenAuto => vec![
                    DeviceCommand::Cut {
                        mix_effect: MIX_EFFECT,
                    },
                    DeviceCommand::AutoTransition {
                        mix_effect: MIX_EFFECT,
                    },
                ],
            },
            MappingEntry::Auto => vec![DeviceCommand::AutoTransition {
                mix_effect: MIX_EFFECT,
            }],
            MappingEntry::AudioGain { .. }
            | MappingEntry::TransitionRate
            | MappingEntry::DveX
            | MappingEntry::DveY
            | MappingEntry::TransitionPosition
            | MappingEntry::SwapPreviewProgram
            | MappingEntry::Unknown { .. } => {
                warn!(
                    "unknown action '{}' for note {note}",
                    entry.action_name()
                );
                return HandleOutcome::UnknownAction;
            }
        };

        self.issue_all(commands).await
    }

    async fn handle_control_change(&self, controller: u8, value: u8) -> HandleOutcome {
        let Some(entry) = self.table.control_change(controller) else {
            info!("no mapping for controller {controller}");
            return HandleOutcome::Unmapped;
        };

        debug!(
            "controller {controller} changed to {value}, mapped to '{}'",
            entry.action_name()
        );

        let commands = match entry {
            MappingEntry::AudioGain { channel } => vec![DeviceCommand::SetAudioGain {
                channel: *channel,
                gain_db: audio_gain_db(value),
            }],
            MappingEntry::TransitionRate => vec![DeviceCommand::SetTransitionRate {
                mix_effect: MIX_EFFECT,
                frames: transition_rate_frames(value),
            }],
            MappingEntry::DveX => vec![self.dve_command(DveAxis::X, value)],
            MappingEntry::DveY => vec![self.dve_command(DveAxis::Y, value)],
            MappingEntry::TransitionPosition => {
                let mut commands = vec![DeviceCommand::SetTransitionPosition {
                    mix_effect: MIX_EFFECT,
                    position: transition_position(value),
                }];
                // Fader at full travel finishes the transition.
                if value == MAX_VALUE {
                    info!("transition fader at full travel, triggering auto transition");
                    commands.push(DeviceCommand::AutoTransition {
                        mix_effect: MIX_EFFECT,
                    });
                }
                commands
            }
            MappingEntry::SwapPreviewProgram => {
                let me = self
                    .device
                    .current_state()
                    .and_then(|state| state.mix_effect(MIX_EFFECT).cloned());
                let Some(me) = me else {
                    warn!("mix-effect {MIX_EFFECT} state not ready, ignoring swap");
                    return HandleOutcome::DeviceNotReady;
                };
                info!(
                    "swapping program ({}) and preview ({})",
                    me.program_input, me.preview_input
                );
                vec![
                    DeviceCommand::SetProgramInput {
                        mix_effect: MIX_EFFECT,
                        input: me.preview_input,
                    },
                    DeviceCommand::SetPreviewInput {
                        mix_effect: MIX_EFFECT,
                        input: me.program_input,
                    },
                ]
            }
            MappingEntry::Program { .. }
            | MappingEntry::Preview { .. }
            | MappingEntry::Macro { .. }
            | MappingEntry::Cut
            | MappingEntry::Auto
            | MappingEntry::Unknown { .. } => {
                warn!(
                    "unknown action '{}' for controller {controller}",
                    entry.action_name()
                );
                return HandleOutcome::UnknownAction;
            }
        };

        self.issue_all(commands).await
    }

    fn dve_command(&self, axis: DveAxis, value: u8) -> DeviceCommand {
        DeviceCommand::SetDvePosition {
            mix_effect: MIX_EFFECT,
            keyer: DVE_KEYER,
            axis,
            position: dve_position(value),
        }
    }

    /// Issues `commands` in order.  A rejected command does not stop the rest.
    async fn issue_all(&self, commands: Vec<DeviceCommand>) -> HandleOutcome {
        let attempted = commands.len();
        let mut failed = 0;
        for command in commands {
            debug!("issuing {command}");
            if let Err(e) = self.device.issue(command.clone()).await {
                warn!("switcher command {} failed: {e}", command.name());
                failed += 1;
            }
        }
        HandleOutcome::Issued { attempted, failed }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DeviceError, MockDeviceGateway};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use switchdeck_core::{DeviceState, MixEffectState};

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingDevice {
        issued: Mutex<Vec<DeviceCommand>>,
        state: Mutex<Option<DeviceState>>,
    }

    impl RecordingDevice {
        fn with_bus(program: u16, preview: u16) -> Self {
            let state = DeviceState {
                mix_effects: vec![MixEffectState {
                    program_input: program,
                    preview_input: preview,
                    ..MixEffectState::default()
                }],
                ..DeviceState::default()
            };
            Self {
                issued: Mutex::new(Vec::new()),
                state: Mutex::new(Some(state)),
            }
        }

        fn issued(&self) -> Vec<DeviceCommand> {
            self.issued.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeviceGateway for RecordingDevice {
        async fn connect(&self, _address: SocketAddr) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn issue(&self, command: DeviceCommand) -> Result<(), DeviceError> {
            self.issued.lock().unwrap().push(command);
            Ok(())
        }

        fn current_state(&self) -> Option<DeviceState> {
            self.state.lock().unwrap().clone()
        }
    }

    fn studio_table() -> MappingTable {
        let notes = BTreeMap::from([
            (36, MappingEntry::Program { input: 1 }),
            (44, MappingEntry::Preview { input: 2 }),
            (50, MappingEntry::Macro { macro_index: 7 }),
            (51, MappingEntry::Cut),
            (52, MappingEntry::Auto),
            (60, MappingEntry::DveX),
            (61, MappingEntry::Unknown {
                action: "fadeToBlack".to_string(),
            }),
        ]);
        let ccs = BTreeMap::from([
            (1, MappingEntry::AudioGain { channel: 3 }),
            (2, MappingEntry::TransitionRate),
            (3, MappingEntry::DveX),
            (4, MappingEntry::DveY),
            (5, MappingEntry::TransitionPosition),
            (6, MappingEntry::SwapPreviewProgram),
            (7, MappingEntry::Cut),
            (8, MappingEntry::Unknown {
                action: "wipe".to_string(),
            }),
        ]);
        MappingTable {
            note_mappings: notes,
            control_change_mappings: Some(ccs),
        }
    }

    fn make_translator(
        device: RecordingDevice,
        cut_behavior: CutBehavior,
    ) -> (EventTranslator, Arc<RecordingDevice>) {
        let device = Arc::new(device);
        let translator = EventTranslator::new(
            Arc::new(studio_table()),
            Arc::clone(&device) as Arc<dyn DeviceGateway>,
            cut_behavior,
        );
        (translator, device)
    }

    fn note(note: u8, velocity: u8) -> ControllerEvent {
        ControllerEvent::Note { note, velocity }
    }

    fn cc(controller: u8, value: u8) -> ControllerEvent {
        ControllerEvent::ControlChange { controller, value }
    }

    // ── Notes ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_zero_velocity_never_issues_for_any_note() {
        // Arrange
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);

        // Act: every note number, mapped or not
        for n in 0..=127u8 {
            let outcome = translator.handle(note(n, 0)).await;
            assert_eq!(outcome, HandleOutcome::Released);
        }

        // Assert
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_program_note_sets_program_input() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);

        let outcome = translator.handle(note(36, 100)).await;

        assert_eq!(
            outcome,
            HandleOutcome::Issued {
                attempted: 1,
                failed: 0
            }
        );
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::SetProgramInput {
                mix_effect: 0,
                input: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_preview_note_sets_preview_input() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(note(44, 1)).await;
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::SetPreviewInput {
                mix_effect: 0,
                input: 2
            }]
        );
    }

    #[tokio::test]
    async fn test_macro_note_runs_macro() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(note(50, 127)).await;
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::RunMacro { macro_index: 7 }]
        );
    }

    #[tokio::test]
    async fn test_cut_issues_cut_only_by_default() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(note(51, 127)).await;
        assert_eq!(device.issued(), vec![DeviceCommand::Cut { mix_effect: 0 }]);
    }

    #[tokio::test]
    async fn test_cut_then_auto_when_legacy_behavior_enabled() {
        let (translator, device) =
            make_translator(RecordingDevice::default(), CutBehavior::CutThenAuto);
        translator.handle(note(51, 127)).await;
        assert_eq!(
            device.issued(),
            vec![
                DeviceCommand::Cut { mix_effect: 0 },
                DeviceCommand::AutoTransition { mix_effect: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_auto_note_issues_auto_transition() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(note(52, 127)).await;
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::AutoTransition { mix_effect: 0 }]
        );
    }

    #[tokio::test]
    async fn test_unmapped_note_is_noop() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        assert_eq!(translator.handle(note(99, 127)).await, HandleOutcome::Unmapped);
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_note_action_issues_nothing() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        assert_eq!(
            translator.handle(note(61, 127)).await,
            HandleOutcome::UnknownAction
        );
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_fader_action_on_note_is_unknown() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        assert_eq!(
            translator.handle(note(60, 127)).await,
            HandleOutcome::UnknownAction
        );
        assert!(device.issued().is_empty());
    }

    // ── Control changes ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_audio_gain_maps_full_travel_to_plus_six_db() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(cc(1, 127)).await;
        let issued = device.issued();
        let DeviceCommand::SetAudioGain { channel, gain_db } = issued[0] else {
            panic!("expected SetAudioGain, got {:?}", issued[0]);
        };
        assert_eq!(channel, 3);
        assert!((gain_db - 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_audio_gain_minimum_is_minus_sixty_db() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(cc(1, 0)).await;
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::SetAudioGain {
                channel: 3,
                gain_db: -60.0
            }]
        );
    }

    #[tokio::test]
    async fn test_transition_rate_full_travel_is_250_frames() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(cc(2, 127)).await;
        translator.handle(cc(2, 0)).await;
        assert_eq!(
            device.issued(),
            vec![
                DeviceCommand::SetTransitionRate {
                    mix_effect: 0,
                    frames: 250
                },
                DeviceCommand::SetTransitionRate {
                    mix_effect: 0,
                    frames: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_dve_knobs_target_keyer_zero() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(cc(3, 0)).await;
        translator.handle(cc(4, 127)).await;
        assert_eq!(
            device.issued(),
            vec![
                DeviceCommand::SetDvePosition {
                    mix_effect: 0,
                    keyer: 0,
                    axis: DveAxis::X,
                    position: -1.0
                },
                DeviceCommand::SetDvePosition {
                    mix_effect: 0,
                    keyer: 0,
                    axis: DveAxis::Y,
                    position: 1.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_transition_position_full_travel_triggers_auto_once() {
        // Arrange
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);

        // Act
        let outcome = translator.handle(cc(5, 127)).await;

        // Assert
        assert_eq!(
            outcome,
            HandleOutcome::Issued {
                attempted: 2,
                failed: 0
            }
        );
        assert_eq!(
            device.issued(),
            vec![
                DeviceCommand::SetTransitionPosition {
                    mix_effect: 0,
                    position: 10_000
                },
                DeviceCommand::AutoTransition { mix_effect: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_transition_position_below_full_travel_has_no_auto() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        translator.handle(cc(5, 126)).await;
        assert_eq!(
            device.issued(),
            vec![DeviceCommand::SetTransitionPosition {
                mix_effect: 0,
                position: 9921
            }]
        );
    }

    #[tokio::test]
    async fn test_swap_without_state_issues_nothing() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        assert_eq!(
            translator.handle(cc(6, 127)).await,
            HandleOutcome::DeviceNotReady
        );
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_swap_without_mix_effect_zero_issues_nothing() {
        // Arrange: the switcher has reported state, but no banks yet.
        let device = RecordingDevice {
            issued: Mutex::new(Vec::new()),
            state: Mutex::new(Some(DeviceState::default())),
        };
        let (translator, device) = make_translator(device, CutBehavior::CutOnly);

        // Act / Assert
        assert_eq!(
            translator.handle(cc(6, 127)).await,
            HandleOutcome::DeviceNotReady
        );
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_swap_exchanges_program_and_preview_in_order() {
        let (translator, device) =
            make_translator(RecordingDevice::with_bus(1, 2), CutBehavior::CutOnly);

        translator.handle(cc(6, 127)).await;

        assert_eq!(
            device.issued(),
            vec![
                DeviceCommand::SetProgramInput {
                    mix_effect: 0,
                    input: 2
                },
                DeviceCommand::SetPreviewInput {
                    mix_effect: 0,
                    input: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_control_change_action_issues_nothing() {
        let (translator, device) = make_translator(RecordingDevice::default(), CutBehavior::CutOnly);
        assert_eq!(
            translator.handle(cc(8, 64)).await,
            HandleOutcome::UnknownAction
        );
        assert_eq!(
            translator.handle(cc(7, 64)).await,
            HandleOutcome::UnknownAction
        );
        assert!(device.issued().is_empty());
    }

    #[tokio::test]
    async fn test_missing_control_change_table_is_unmapped() {
        // Arrange
        let device: Arc<dyn DeviceGateway> = Arc::new(RecordingDevice::default());
        let table = MappingTable {
            note_mappings: BTreeMap::new(),
            control_change_mappings: None,
        };
        let translator = EventTranslator::new(Arc::new(table), device, CutBehavior::CutOnly);

        // Act / Assert
        assert_eq!(translator.handle(cc(1, 64)).await, HandleOutcome::Unmapped);
    }

    // ── Gateway failures ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_failed_issue_is_absorbed_and_sequence_continues() {
        // Arrange: the first command of the swap is rejected, the second accepted.
        let mut mock = MockDeviceGateway::new();
        mock.expect_current_state()
            .returning(|| Some(DeviceState::with_banks(1)));
        let mut seq = mockall::Sequence::new();
        mock.expect_issue()
            .withf(|c| matches!(c, DeviceCommand::SetProgramInput { input: 2, .. }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DeviceError::NotConnected));
        mock.expect_issue()
            .withf(|c| matches!(c, DeviceCommand::SetPreviewInput { input: 1, .. }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let translator = EventTranslator::new(
            Arc::new(studio_table()),
            Arc::new(mock),
            CutBehavior::CutOnly,
        );

        // Act
        let outcome = translator.handle(cc(6, 127)).await;

        // Assert
        assert_eq!(
            outcome,
            HandleOutcome::Issued {
                attempted: 2,
                failed: 1
            }
        );
    }
}

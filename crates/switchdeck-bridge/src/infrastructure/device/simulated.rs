//! In-process switcher model.
//!
//! State lives behind a `RwLock` and is replaced wholesale on every accepted
//! command, so [`DeviceGateway::current_state`] always returns a consistent
//! snapshot.  `StateChanged` is emitted only when a command actually changed
//! something; re-selecting the input already on program produces no event.
//!
//! Events are queued without waiting: `issue` runs on the same loop that
//! drains the queue.  A `StateChanged` that finds the queue full is dropped,
//! since one already queued makes the loop re-read the latest state.

use std::net::SocketAddr;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use switchdeck_core::domain::command::TRANSITION_POSITION_MAX;
use switchdeck_core::{DeviceCommand, DeviceState};

use crate::application::ports::{DeviceError, DeviceEvent, DeviceGateway};

/// Depth of the device event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct SimulatedSwitcher {
    banks: usize,
    state: RwLock<Option<DeviceState>>,
    events: mpsc::Sender<DeviceEvent>,
}

impl SimulatedSwitcher {
    /// Creates a disconnected switcher with one mix-effect bank.
    pub fn new() -> (Self, mpsc::Receiver<DeviceEvent>) {
        Self::with_banks(1)
    }

    /// Creates a disconnected switcher with `banks` mix-effect banks.
    pub fn with_banks(banks: usize) -> (Self, mpsc::Receiver<DeviceEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let switcher = Self {
            banks,
            state: RwLock::new(None),
            events: tx,
        };
        (switcher, rx)
    }

    fn emit(&self, event: DeviceEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                debug!("device event queue full; dropping {event:?}");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("device event channel closed");
            }
        }
    }

    fn read_state(&self) -> Result<Option<DeviceState>, DeviceError> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| DeviceError::NotConnected)
    }
}

/// Applies `command` to `state`.
fn apply(state: &mut DeviceState, command: &DeviceCommand) -> Result<(), DeviceError> {
    let rejected = |reason: String| DeviceError::Rejected {
        command: command.name().to_string(),
        reason,
    };
    let missing_bank = |me: u8| rejected(format!("mix-effect {me} does not exist"));

    match *command {
        DeviceCommand::SetProgramInput { mix_effect, input } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            me.program_input = input;
        }
        DeviceCommand::SetPreviewInput { mix_effect, input } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            me.preview_input = input;
        }
        DeviceCommand::RunMacro { macro_index } => {
            state.last_macro = Some(macro_index);
        }
        DeviceCommand::Cut { mix_effect } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            std::mem::swap(&mut me.program_input, &mut me.preview_input);
        }
        DeviceCommand::AutoTransition { mix_effect } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            std::mem::swap(&mut me.program_input, &mut me.preview_input);
            me.transition_position = 0;
        }
        DeviceCommand::SetAudioGain { channel, gain_db } => {
            state.audio_gains.insert(channel, gain_db);
        }
        DeviceCommand::SetTransitionRate { mix_effect, frames } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            me.transition_rate_frames = frames;
        }
        DeviceCommand::SetTransitionPosition {
            mix_effect,
            position,
        } => {
            let me = state
                .mix_effect_mut(mix_effect)
                .ok_or_else(|| missing_bank(mix_effect))?;
            me.transition_position = position.min(TRANSITION_POSITION_MAX);
        }
        DeviceCommand::SetDvePosition {
            mix_effect,
            keyer,
            axis,
            position,
        } => {
            if state.mix_effect(mix_effect).is_none() {
                return Err(missing_bank(mix_effect));
            }
            let dve = state
                .upstream_keyers
                .get_mut(usize::from(keyer))
                .ok_or_else(|| rejected(format!("keyer {keyer} does not exist")))?;
            *dve = dve.with_axis(axis, position);
        }
    }
    Ok(())
}

#[async_trait]
impl DeviceGateway for SimulatedSwitcher {
    async fn connect(&self, address: SocketAddr) -> Result<(), DeviceError> {
        self.state
            .write()
            .map(|mut guard| *guard = Some(DeviceState::with_banks(self.banks)))
            .map_err(|_| DeviceError::Unreachable {
                address,
                reason: "state lock poisoned".to_string(),
            })?;
        info!("simulated switcher online as {address}");

        self.emit(DeviceEvent::Connected { address });
        self.emit(DeviceEvent::StateChanged);
        Ok(())
    }

    async fn issue(&self, command: DeviceCommand) -> Result<(), DeviceError> {
        let changed = {
            let mut guard = self.state.write().map_err(|_| DeviceError::NotConnected)?;
            let Some(current) = guard.as_mut() else {
                return Err(DeviceError::NotConnected);
            };
            let mut next = current.clone();
            apply(&mut next, &command)?;
            if next == *current {
                false
            } else {
                *current = next;
                true
            }
        };

        if changed {
            self.emit(DeviceEvent::StateChanged);
        } else {
            debug!("{command} left the switcher unchanged");
        }
        Ok(())
    }

    fn current_state(&self) -> Option<DeviceState> {
        self.read_state().ok().flatten()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

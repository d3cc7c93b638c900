//! Switcher state snapshot.
//!
//! The device gateway owns and mutates this state; the core only ever reads a
//! cloned snapshot, so program and preview are always observed together.

use std::collections::BTreeMap;

use super::command::DveAxis;

/// State of one mix-effect bank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixEffectState {
    pub program_input: u16,
    pub preview_input: u16,
    /// Auto transition duration in frames.
    pub transition_rate_frames: u16,
    /// Manual transition position, 0–10000.
    pub transition_position: u16,
}

/// DVE position of one upstream keyer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DveState {
    pub position_x: f64,
    pub position_y: f64,
}

impl DveState {
    /// Returns a copy with `axis` set to `position`.
    pub fn with_axis(self, axis: DveAxis, position: f64) -> Self {
        match axis {
            DveAxis::X => Self {
                position_x: position,
                ..self
            },
            DveAxis::Y => Self {
                position_y: position,
                ..self
            },
        }
    }
}

/// Everything the bridge knows about the switcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// Mix-effect banks, indexed by bank number.
    pub mix_effects: Vec<MixEffectState>,
    /// Upstream keyers of mix-effect 0, indexed by keyer number.
    pub upstream_keyers: Vec<DveState>,
    /// Audio input gain in dB, keyed by input channel.
    pub audio_gains: BTreeMap<u16, f64>,
    /// The most recently started macro.
    pub last_macro: Option<u16>,
}

impl DeviceState {
    /// A state with `banks` mix-effects, each with program 1 / preview 2,
    /// and a single upstream keyer.
    pub fn with_banks(banks: usize) -> Self {
        Self {
            mix_effects: vec![
                MixEffectState {
                    program_input: 1,
                    preview_input: 2,
                    transition_rate_frames: 25,
                    transition_position: 0,
                };
                banks
            ],
            upstream_keyers: vec![DveState::default()],
            ..Self::default()
        }
    }

    /// Returns bank `index`, or `None` if the switcher has not reported it.
    pub fn mix_effect(&self, index: u8) -> Option<&MixEffectState> {
        self.mix_effects.get(usize::from(index))
    }

    pub fn mix_effect_mut(&mut self, index: u8) -> Option<&mut MixEffectState> {
        self.mix_effects.get_mut(usize::from(index))
    }
}

//! Switcher command set and controller-value scaling.
//!
//! Every command the bridge can send is one variant of [`DeviceCommand`].
//! The scaling functions below map a 7-bit controller value (0–127) onto the
//! numeric range each switcher parameter expects.  Inputs above 127 are
//! clamped, so the outputs always stay inside their documented ranges.

use std::fmt;

use super::events::MAX_VALUE;

/// Lowest audio gain reachable from a fader, in dB.
pub const AUDIO_GAIN_MIN_DB: f64 = -60.0;
/// Span of the audio gain range, in dB (−60 dB … +6 dB).
pub const AUDIO_GAIN_SPAN_DB: f64 = 66.0;
/// Longest transition rate reachable from a knob, in frames.
pub const TRANSITION_RATE_MAX_FRAMES: u16 = 250;
/// Full-scale manual transition position.
pub const TRANSITION_POSITION_MAX: u16 = 10_000;

/// Axis of an upstream-keyer DVE position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DveAxis {
    X,
    Y,
}

/// A command issued to the switcher.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    SetProgramInput { mix_effect: u8, input: u16 },
    SetPreviewInput { mix_effect: u8, input: u16 },
    RunMacro { macro_index: u16 },
    Cut { mix_effect: u8 },
    AutoTransition { mix_effect: u8 },
    /// `gain_db` ∈ [−60.0, +6.0].
    SetAudioGain { channel: u16, gain_db: f64 },
    /// `frames` ∈ [0, 250].
    SetTransitionRate { mix_effect: u8, frames: u16 },
    /// `position` ∈ [0, 10000].
    SetTransitionPosition { mix_effect: u8, position: u16 },
    /// `position` ∈ [−1.0, +1.0].
    SetDvePosition {
        mix_effect: u8,
        keyer: u8,
        axis: DveAxis,
        position: f64,
    },
}

impl DeviceCommand {
    /// Short command name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::SetProgramInput { .. } => "SetProgramInput",
            DeviceCommand::SetPreviewInput { .. } => "SetPreviewInput",
            DeviceCommand::RunMacro { .. } => "RunMacro",
            DeviceCommand::Cut { .. } => "Cut",
            DeviceCommand::AutoTransition { .. } => "AutoTransition",
            DeviceCommand::SetAudioGain { .. } => "SetAudioGain",
            DeviceCommand::SetTransitionRate { .. } => "SetTransitionRate",
            DeviceCommand::SetTransitionPosition { .. } => "SetTransitionPosition",
            DeviceCommand::SetDvePosition { .. } => "SetDvePosition",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::SetProgramInput { mix_effect, input } => {
                write!(f, "SetProgramInput(me={mix_effect}, input={input})")
            }
            DeviceCommand::SetPreviewInput { mix_effect, input } => {
                write!(f, "SetPreviewInput(me={mix_effect}, input={input})")
            }
            DeviceCommand::RunMacro { macro_index } => write!(f, "RunMacro({macro_index})"),
            DeviceCommand::Cut { mix_effect } => write!(f, "Cut(me={mix_effect})"),
            DeviceCommand::AutoTransition { mix_effect } => {
                write!(f, "AutoTransition(me={mix_effect})")
            }
            DeviceCommand::SetAudioGain { channel, gain_db } => {
                write!(f, "SetAudioGain(channel={channel}, gain={gain_db:.2}dB)")
            }
            DeviceCommand::SetTransitionRate { mix_effect, frames } => {
                write!(f, "SetTransitionRate(me={mix_effect}, frames={frames})")
            }
            DeviceCommand::SetTransitionPosition {
                mix_effect,
                position,
            } => write!(f, "SetTransitionPosition(me={mix_effect}, position={position})"),
            DeviceCommand::SetDvePosition {
                mix_effect,
                keyer,
                axis,
                position,
            } => write!(
                f,
                "SetDvePosition(me={mix_effect}, keyer={keyer}, axis={axis:?}, position={position:.2})"
            ),
        }
    }
}

/// Fraction of full scale for a 7-bit value, clamped to [0, 1].
fn unit(value: u8) -> f64 {
    f64::from(value.min(MAX_VALUE)) / f64::from(MAX_VALUE)
}

/// Maps a fader value onto audio gain: `value/127 * 66 - 60` dB.
pub fn audio_gain_db(value: u8) -> f64 {
    unit(value) * AUDIO_GAIN_SPAN_DB + AUDIO_GAIN_MIN_DB
}

/// Maps a knob value onto a transition rate in frames, rounded to the nearest frame.
pub fn transition_rate_frames(value: u8) -> u16 {
    (unit(value) * f64::from(TRANSITION_RATE_MAX_FRAMES)).round() as u16
}

/// Maps a knob value onto a DVE position in [−1, +1].
pub fn dve_position(value: u8) -> f64 {
    unit(value) * 2.0 - 1.0
}

/// Maps a fader value onto the manual transition position, rounded.
pub fn transition_position(value: u8) -> u16 {
    (unit(value) * f64::from(TRANSITION_POSITION_MAX)).round() as u16
}

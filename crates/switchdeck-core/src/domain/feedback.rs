//! LED feedback and observer messages derived from switcher state.
//!
//! Feedback is never stored.  Each time the switcher reports a change, the
//! full LED set is recomputed from the mapping table and the current
//! mix-effect 0 snapshot, which keeps the surface from drifting out of sync.

use serde::{Deserialize, Serialize};

use super::mapping::{MappingEntry, MappingTable};
use super::state::MixEffectState;

/// MIDI status byte for Note On, channel 1.
pub const NOTE_ON: u8 = 0x90;

/// Colour of a pad LED.
///
/// Controllers in the note/velocity family pick the LED colour from the
/// note-on velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    Red,
    Green,
    Amber,
}

impl LedColor {
    /// Velocity byte that selects this colour.
    pub fn velocity(self) -> u8 {
        match self {
            LedColor::Off => 0,
            LedColor::Red => 127,
            LedColor::Green => 100,
            LedColor::Amber => 127,
        }
    }
}

/// One LED update for the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedFeedback {
    pub note: u8,
    pub color: LedColor,
}

impl LedFeedback {
    /// Encodes the update as a 3-byte note-on message `[0x90, note, velocity]`.
    pub fn to_note_on(self) -> [u8; 3] {
        [NOTE_ON, self.note, self.color.velocity()]
    }
}

/// Computes the LED state of every program and preview button.
///
/// Program buttons light red when their input is on program; preview buttons
/// light green when their input is on preview.  All other mapped notes are
/// left alone.  The result is in ascending note order.
pub fn derive_led_feedback(table: &MappingTable, me: &MixEffectState) -> Vec<LedFeedback> {
    table
        .notes()
        .filter_map(|(note, entry)| {
            let color = match entry {
                MappingEntry::Program { input } if *input == me.program_input => LedColor::Red,
                MappingEntry::Preview { input } if *input == me.preview_input => LedColor::Green,
                MappingEntry::Program { .. } | MappingEntry::Preview { .. } => LedColor::Off,
                _ => return None,
            };
            Some(LedFeedback { note, color })
        })
        .collect()
}

/// Messages pushed to browser observers.
///
/// ```json
/// {"type":"deviceUpdate","program":1,"preview":2}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObserverMessage {
    DeviceUpdate { program: u16, preview: u16 },
}

impl ObserverMessage {
    /// Builds the update for a mix-effect snapshot.
    pub fn device_update(me: &MixEffectState) -> Self {
        ObserverMessage::DeviceUpdate {
            program: me.program_input,
            preview: me.preview_input,
        }
    }
}

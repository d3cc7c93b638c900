//! Controller input events.
//!
//! The control surface is modelled as a generic note / control-change device.
//! Raw MIDI bytes from the driver are decoded with `midly`'s live-event parser;
//! only Note On, Note Off and Control Change messages survive.  The MIDI
//! channel is not part of the model.

use midly::live::LiveEvent;
use midly::MidiMessage;

/// Highest value a 7-bit MIDI data byte can carry.
pub const MAX_VALUE: u8 = 127;

/// An input event produced by the controller gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A pad or button.  `velocity == 0` means the button was released.
    Note { note: u8, velocity: u8 },
    /// A fader, knob, or other continuous control.
    ControlChange { controller: u8, value: u8 },
}

impl ControllerEvent {
    /// Decodes one raw MIDI message.
    ///
    /// Note Off is reported as a note with velocity 0 so that both release
    /// encodings look the same to the translator.  Returns `None` for
    /// malformed bytes and for message types the bridge does not use
    /// (pitch bend, aftertouch, program change, system messages).
    pub fn from_midi(bytes: &[u8]) -> Option<Self> {
        let event = LiveEvent::parse(bytes).ok()?;
        let LiveEvent::Midi { message, .. } = event else {
            return None;
        };
        match message {
            MidiMessage::NoteOn { key, vel } => Some(ControllerEvent::Note {
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOff { key, .. } => Some(ControllerEvent::Note {
                note: key.as_int(),
                velocity: 0,
            }),
            MidiMessage::Controller { controller, value } => {
                Some(ControllerEvent::ControlChange {
                    controller: controller.as_int(),
                    value: value.as_int(),
                })
            }
            _ => None,
        }
    }

    /// Returns `true` for a note event that signals a release.
    pub fn is_release(&self) -> bool {
        matches!(self, ControllerEvent::Note { velocity: 0, .. })
    }
}

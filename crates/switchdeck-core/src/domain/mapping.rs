//! Mapping table: declarative rules from controller inputs to switcher actions.
//!
//! The table is loaded once from a JSON document of the form:
//!
//! ```json
//! {
//!   "noteMappings": {
//!     "36": { "action": "program", "input": 1 },
//!     "44": { "action": "preview", "input": 1 },
//!     "50": { "action": "macro", "macroIndex": 0 },
//!     "51": { "action": "cut" }
//!   },
//!   "controlChangeMappings": {
//!     "7":  { "action": "audioGain", "channel": 1 },
//!     "14": { "action": "transitionPosition" }
//!   }
//! }
//! ```
//!
//! Keys are string-encoded MIDI numbers (0–127).  A key that is not such a
//! number can never match an event; it is dropped from the table and reported
//! through [`MappingTable::parse`].  Each entry is parsed into a closed
//! [`MappingEntry`] variant so dispatch code can match exhaustively.
//! An unrecognised `action` string is kept as [`MappingEntry::Unknown`] rather
//! than rejected: the translator logs it at press time and carries on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a mapping document.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A known action is missing the parameter it needs.
    #[error("mapping action '{action}' requires field '{field}'")]
    MissingField {
        action: String,
        field: &'static str,
    },

    /// The document is not valid JSON or does not match the schema.
    #[error("invalid mapping document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which of the two lookup tables an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingCategory {
    Note,
    ControlChange,
}

/// One controller input's bound action.
///
/// Serialized with an `"action"` discriminant and camelCase parameter names,
/// matching the on-disk document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMappingEntry", into = "RawMappingEntry")]
pub enum MappingEntry {
    /// Put `input` on program (mix-effect 0).
    Program { input: u16 },
    /// Put `input` on preview (mix-effect 0).
    Preview { input: u16 },
    /// Run the stored macro at `macro_index`.
    Macro { macro_index: u16 },
    /// Hard cut between program and preview.
    Cut,
    /// Auto transition using the configured rate.
    Auto,
    /// Fader mapped to the gain of audio input `channel`.
    AudioGain { channel: u16 },
    /// Knob mapped to the transition rate in frames.
    TransitionRate,
    /// Knob mapped to the horizontal DVE position of upstream keyer 0.
    DveX,
    /// Knob mapped to the vertical DVE position of upstream keyer 0.
    DveY,
    /// T-bar style fader mapped to the manual transition position.
    TransitionPosition,
    /// Exchange the program and preview sources.
    SwapPreviewProgram,
    /// Anything else; the original action string is preserved for logging.
    Unknown { action: String },
}

impl MappingEntry {
    /// Returns the action name exactly as it appears in the JSON document.
    pub fn action_name(&self) -> &str {
        match self {
            MappingEntry::Program { .. } => "program",
            MappingEntry::Preview { .. } => "preview",
            MappingEntry::Macro { .. } => "macro",
            MappingEntry::Cut => "cut",
            MappingEntry::Auto => "auto",
            MappingEntry::AudioGain { .. } => "audioGain",
            MappingEntry::TransitionRate => "transitionRate",
            MappingEntry::DveX => "dveX",
            MappingEntry::DveY => "dveY",
            MappingEntry::TransitionPosition => "transitionPosition",
            MappingEntry::SwapPreviewProgram => "swapPreviewProgram",
            MappingEntry::Unknown { action } => action,
        }
    }

    /// Returns `true` if the translator knows how to act on this entry when it
    /// is bound in `category`.
    ///
    /// Button actions only fire from notes; continuous actions only fire from
    /// control changes.
    pub fn is_valid_for(&self, category: MappingCategory) -> bool {
        match self {
            MappingEntry::Program { .. }
            | MappingEntry::Preview { .. }
            | MappingEntry::Macro { .. }
            | MappingEntry::Cut
            | MappingEntry::Auto => category == MappingCategory::Note,
            MappingEntry::AudioGain { .. }
            | MappingEntry::TransitionRate
            | MappingEntry::DveX
            | MappingEntry::DveY
            | MappingEntry::TransitionPosition
            | MappingEntry::SwapPreviewProgram => category == MappingCategory::ControlChange,
            MappingEntry::Unknown { .. } => false,
        }
    }
}

/// Flat wire shape of an entry, used only for serde conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMappingEntry {
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    macro_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<u16>,
}

impl TryFrom<RawMappingEntry> for MappingEntry {
    type Error = MappingError;

    fn try_from(raw: RawMappingEntry) -> Result<Self, Self::Error> {
        let require = |value: Option<u16>, field: &'static str| {
            value.ok_or_else(|| MappingError::MissingField {
                action: raw.action.clone(),
                field,
            })
        };

        Ok(match raw.action.as_str() {
            "program" => MappingEntry::Program {
                input: require(raw.input, "input")?,
            },
            "preview" => MappingEntry::Preview {
                input: require(raw.input, "input")?,
            },
            "macro" => MappingEntry::Macro {
                macro_index: require(raw.macro_index, "macroIndex")?,
            },
            "cut" => MappingEntry::Cut,
            "auto" => MappingEntry::Auto,
            "audioGain" => MappingEntry::AudioGain {
                channel: require(raw.channel, "channel")?,
            },
            "transitionRate" => MappingEntry::TransitionRate,
            "dveX" => MappingEntry::DveX,
            "dveY" => MappingEntry::DveY,
            "transitionPosition" => MappingEntry::TransitionPosition,
            "swapPreviewProgram" => MappingEntry::SwapPreviewProgram,
            _ => MappingEntry::Unknown {
                action: raw.action.clone(),
            },
        })
    }
}

impl From<MappingEntry> for RawMappingEntry {
    fn from(entry: MappingEntry) -> Self {
        let mut raw = RawMappingEntry {
            action: entry.action_name().to_string(),
            input: None,
            macro_index: None,
            channel: None,
        };
        match entry {
            MappingEntry::Program { input } | MappingEntry::Preview { input } => {
                raw.input = Some(input);
            }
            MappingEntry::Macro { macro_index } => raw.macro_index = Some(macro_index),
            MappingEntry::AudioGain { channel } => raw.channel = Some(channel),
            _ => {}
        }
        raw
    }
}

/// Highest note or controller number a 7-bit MIDI message can carry.
const MIDI_DATA_MAX: u8 = 127;

/// A document key that is not a MIDI number in 0–127.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredKey {
    pub category: MappingCategory,
    pub key: String,
}

/// The complete, immutable mapping configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawMappingTable")]
pub struct MappingTable {
    /// Note number → entry.
    #[serde(default)]
    pub note_mappings: BTreeMap<u8, MappingEntry>,

    /// Controller number → entry.  `None` when the document has no
    /// `controlChangeMappings` section at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_change_mappings: Option<BTreeMap<u8, MappingEntry>>,
}

/// Document shape with keys as written, before range checking.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMappingTable {
    #[serde(default)]
    note_mappings: BTreeMap<String, MappingEntry>,
    #[serde(default)]
    control_change_mappings: Option<BTreeMap<String, MappingEntry>>,
}

fn parse_midi_key(key: &str) -> Option<u8> {
    key.parse::<u8>().ok().filter(|id| *id <= MIDI_DATA_MAX)
}

impl RawMappingTable {
    fn split(self) -> (MappingTable, Vec<IgnoredKey>) {
        let mut ignored = Vec::new();
        let mut keep = |category: MappingCategory, entries: BTreeMap<String, MappingEntry>| {
            entries
                .into_iter()
                .filter_map(|(key, entry)| match parse_midi_key(&key) {
                    Some(id) => Some((id, entry)),
                    None => {
                        ignored.push(IgnoredKey { category, key });
                        None
                    }
                })
                .collect::<BTreeMap<u8, MappingEntry>>()
        };

        let note_mappings = keep(MappingCategory::Note, self.note_mappings);
        let control_change_mappings = self
            .control_change_mappings
            .map(|entries| keep(MappingCategory::ControlChange, entries));

        let table = MappingTable {
            note_mappings,
            control_change_mappings,
        };
        (table, ignored)
    }
}

impl From<RawMappingTable> for MappingTable {
    fn from(raw: RawMappingTable) -> Self {
        raw.split().0
    }
}

impl MappingTable {
    /// Parses a mapping document, discarding keys outside 0–127.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Json`] for malformed JSON or a known action
    /// missing its parameter.
    pub fn from_json(text: &str) -> Result<Self, MappingError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a mapping document and also returns every key that was dropped
    /// because it is not a MIDI number in 0–127.
    ///
    /// # Errors
    ///
    /// Same as [`MappingTable::from_json`].
    pub fn parse(text: &str) -> Result<(Self, Vec<IgnoredKey>), MappingError> {
        let raw: RawMappingTable = serde_json::from_str(text)?;
        Ok(raw.split())
    }

    /// Looks up the entry bound to `note`.
    pub fn note(&self, note: u8) -> Option<&MappingEntry> {
        self.note_mappings.get(&note)
    }

    /// Looks up the entry bound to controller number `controller`.
    pub fn control_change(&self, controller: u8) -> Option<&MappingEntry> {
        self.control_change_mappings.as_ref()?.get(&controller)
    }

    /// Iterates over note mappings in ascending note order.
    pub fn notes(&self) -> impl Iterator<Item = (u8, &MappingEntry)> {
        self.note_mappings.iter().map(|(note, entry)| (*note, entry))
    }

    /// Returns every entry that will be reported as an unknown action when
    /// triggered: unrecognised action strings, and actions bound in the wrong
    /// table.
    pub fn unusable_entries(&self) -> Vec<(MappingCategory, u8, &MappingEntry)> {
        let notes = self
            .note_mappings
            .iter()
            .map(|(id, e)| (MappingCategory::Note, *id, e));
        let ccs = self
            .control_change_mappings
            .iter()
            .flatten()
            .map(|(id, e)| (MappingCategory::ControlChange, *id, e));

        notes
            .chain(ccs)
            .filter(|(category, _, entry)| !entry.is_valid_for(*category))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

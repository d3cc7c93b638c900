//! MIDI control surface gateway.
//!
//! Ports are opened by index, in the order the platform MIDI driver lists
//! them.  The input callback runs on a driver-owned thread; it decodes each
//! raw message and forwards recognised events into a Tokio channel so that
//! all handling happens on the dispatch loop.
//!
//! # Testability
//!
//! [`mock::MockSurface`] stands in for a real device: tests inject events and
//! inspect the LED messages the bridge sent.

use std::sync::Mutex;

use async_trait::async_trait;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use switchdeck_core::ControllerEvent;

use crate::application::ports::{ControllerError, ControllerOutput};

pub mod mock;

/// Client name the bridge registers with the MIDI driver.
const CLIENT_NAME: &str = "switchdeck";

/// One port as listed by the MIDI driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
}

/// Lists every MIDI input port.
pub fn list_input_ports() -> Result<Vec<PortInfo>, ControllerError> {
    let input = MidiInput::new(CLIENT_NAME).map_err(|e| ControllerError::Init(e.to_string()))?;
    Ok(input
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| PortInfo {
            index,
            name: input
                .port_name(port)
                .unwrap_or_else(|_| "<unknown>".to_string()),
        })
        .collect())
}

/// Lists every MIDI output port.
pub fn list_output_ports() -> Result<Vec<PortInfo>, ControllerError> {
    let output = MidiOutput::new(CLIENT_NAME).map_err(|e| ControllerError::Init(e.to_string()))?;
    Ok(output
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| PortInfo {
            index,
            name: output
                .port_name(port)
                .unwrap_or_else(|_| "<unknown>".to_string()),
        })
        .collect())
}

/// Picks port `index` out of `ports`.
fn select_port<T: Clone>(ports: &[T], index: usize) -> Result<T, ControllerError> {
    ports
        .get(index)
        .cloned()
        .ok_or(ControllerError::PortOutOfRange {
            index,
            available: ports.len(),
        })
}

/// An open input port.  Events stop when this is dropped.
pub struct MidiInputHandle {
    _connection: MidiInputConnection<()>,
}

/// Opens input port `index` and forwards decoded events to `events`.
///
/// Messages other than note on/off and control change are logged and
/// dropped.
pub fn open_input(
    index: usize,
    events: mpsc::Sender<ControllerEvent>,
) -> Result<MidiInputHandle, ControllerError> {
    let input = MidiInput::new(CLIENT_NAME).map_err(|e| ControllerError::Init(e.to_string()))?;
    let port = select_port(&input.ports(), index)?;
    let name = input
        .port_name(&port)
        .unwrap_or_else(|_| "<unknown>".to_string());

    let connection = input
        .connect(
            &port,
            "switchdeck-input",
            move |_timestamp_us, message, _| {
                debug!("MIDI in: {message:02x?}");
                let Some(event) = ControllerEvent::from_midi(message) else {
                    return;
                };
                match events.try_send(event) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(event)) => {
                        warn!("controller event queue full; dropping {event:?}");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("controller event channel closed");
                    }
                }
            },
            (),
        )
        .map_err(|e| ControllerError::Open {
            index,
            reason: e.to_string(),
        })?;

    info!("opened MIDI input {index}: {name}");
    Ok(MidiInputHandle {
        _connection: connection,
    })
}

/// An open output port, used for LED feedback.
pub struct MidiOutputPort {
    connection: Mutex<MidiOutputConnection>,
}

impl MidiOutputPort {
    /// Opens output port `index`.
    pub fn open(index: usize) -> Result<Self, ControllerError> {
        let output =
            MidiOutput::new(CLIENT_NAME).map_err(|e| ControllerError::Init(e.to_string()))?;
        let port = select_port(&output.ports(), index)?;
        let name = output
            .port_name(&port)
            .unwrap_or_else(|_| "<unknown>".to_string());

        let connection =
            output
                .connect(&port, "switchdeck-output")
                .map_err(|e| ControllerError::Open {
                    index,
                    reason: e.to_string(),
                })?;

        info!("opened MIDI output {index}: {name}");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

#[async_trait]
impl ControllerOutput for MidiOutputPort {
    async fn send_output(&self, message: &[u8]) -> Result<(), ControllerError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| ControllerError::Send("output port lock poisoned".to_string()))?;
        connection
            .send(message)
            .map_err(|e| ControllerError::Send(e.to_string()))
    }
}

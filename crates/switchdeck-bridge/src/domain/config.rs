//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is read once at startup; nothing is hot-reloaded.  The binary builds it
//! from CLI arguments and environment variables, tests build it directly.

use std::net::SocketAddr;
use std::path::PathBuf;

/// How a `cut` button behaves.
///
/// Early deployments of this bridge issued an auto transition right after
/// every cut.  Rigs whose operators rely on that can opt back in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CutBehavior {
    /// `cut` issues a single Cut command.
    #[default]
    CutOnly,
    /// `cut` issues Cut followed by AutoTransition.
    CutThenAuto,
}

/// All runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Network address of the switcher.
    pub device_addr: SocketAddr,

    /// Index of the MIDI input port the control surface sends on.
    pub midi_input_port: usize,

    /// Index of the MIDI output port that drives the surface LEDs.
    pub midi_output_port: usize,

    /// Path to the JSON mapping document.
    pub mappings_path: PathBuf,

    /// Address the HTTP server (UI page, mapping endpoint) binds to.
    pub http_bind_addr: SocketAddr,

    /// Address the observer WebSocket server binds to.
    pub ws_bind_addr: SocketAddr,

    /// Directory of static UI assets.
    pub public_dir: PathBuf,

    /// Page served at `/`.
    pub index_file: PathBuf,

    pub cut_behavior: CutBehavior,
}

impl Default for BridgeConfig {
    /// | Field            | Default               |
    /// |------------------|-----------------------|
    /// | device_addr      | `192.168.0.116:9910`  |
    /// | midi_input_port  | `0`                   |
    /// | midi_output_port | `1`                   |
    /// | mappings_path    | `mappings.json`       |
    /// | http_bind_addr   | `0.0.0.0:3000`        |
    /// | ws_bind_addr     | `0.0.0.0:3001`        |
    /// | public_dir       | `public`              |
    /// | index_file       | `index.html`          |
    /// | cut_behavior     | `CutOnly`             |
    fn default() -> Self {
        Self {
            device_addr: SocketAddr::from(([192, 168, 0, 116], 9910)),
            midi_input_port: 0,
            midi_output_port: 1,
            mappings_path: PathBuf::from("mappings.json"),
            http_bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            public_dir: PathBuf::from("public"),
            index_file: PathBuf::from("index.html"),
            cut_behavior: CutBehavior::CutOnly,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Switchdeck bridge: entry point.
//!
//! Connects a MIDI control surface to a video production switcher, mirrors the
//! switcher's program/preview selection back onto the surface LEDs, and serves
//! a small browser UI that shows the live selection.
//!
//! # Usage
//!
//! ```text
//! switchdeck [OPTIONS]
//!
//! Options:
//!   --device-addr <ADDR>         Switcher address [default: 192.168.0.116:9910]
//!   --midi-input-port <INDEX>    MIDI input port index [default: 0]
//!   --midi-output-port <INDEX>   MIDI output port index [default: 1]
//!   --mappings <PATH>            Mapping document [default: mappings.json]
//!   --http-bind <ADDR>           HTTP server address [default: 0.0.0.0:3000]
//!   --ws-bind <ADDR>             Observer WebSocket address [default: 0.0.0.0:3001]
//!   --public-dir <PATH>          Static UI assets [default: public]
//!   --index-file <PATH>          Page served at / [default: index.html]
//!   --legacy-cut-fallthrough     Follow every cut with an auto transition
//!   --list-ports                 Print MIDI ports and exit
//! ```
//!
//! Every option can also be set through the environment variable shown in
//! `--help`.  Log verbosity follows `RUST_LOG` (default `info`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use switchdeck_bridge::application::{run_dispatch_loop, AppContext, DeviceGateway};
use switchdeck_bridge::domain::{BridgeConfig, CutBehavior};
use switchdeck_bridge::infrastructure::controller::{
    list_input_ports, list_output_ports, open_input, MidiOutputPort,
};
use switchdeck_bridge::infrastructure::device::SimulatedSwitcher;
use switchdeck_bridge::infrastructure::http::{run_http_server, HttpState};
use switchdeck_bridge::infrastructure::observers::{run_observer_server, ObserverBroadcast};
use switchdeck_bridge::infrastructure::storage::load_mapping_table;

/// Depth of the controller event queue between the MIDI driver and the
/// dispatch loop.
const CONTROLLER_QUEUE_DEPTH: usize = 256;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// MIDI control surface to video switcher bridge.
#[derive(Debug, Parser)]
#[command(
    name = "switchdeck",
    about = "Drive a video switcher from a MIDI control surface",
    version
)]
struct Cli {
    /// Network address of the switcher.
    #[arg(long, default_value = "192.168.0.116:9910", env = "SWITCHER_ADDR")]
    device_addr: String,

    /// Index of the MIDI input port (see `--list-ports`).
    #[arg(long, default_value_t = 0, env = "MIDI_INPUT_PORT_INDEX")]
    midi_input_port: usize,

    /// Index of the MIDI output port used for LED feedback.
    #[arg(long, default_value_t = 1, env = "MIDI_OUTPUT_PORT_INDEX")]
    midi_output_port: usize,

    /// Path to the mapping document.
    #[arg(long, default_value = "mappings.json", env = "SWITCHDECK_MAPPINGS")]
    mappings: PathBuf,

    /// Address the HTTP server binds to.
    #[arg(long, default_value = "0.0.0.0:3000", env = "SWITCHDECK_HTTP_BIND")]
    http_bind: String,

    /// Address the observer WebSocket server binds to.
    #[arg(long, default_value = "0.0.0.0:3001", env = "SWITCHDECK_WS_BIND")]
    ws_bind: String,

    /// Directory of static UI assets.
    #[arg(long, default_value = "public", env = "SWITCHDECK_PUBLIC_DIR")]
    public_dir: PathBuf,

    /// Page served at `/`.
    #[arg(long, default_value = "index.html", env = "SWITCHDECK_INDEX_FILE")]
    index_file: PathBuf,

    /// Issue an auto transition right after every cut.
    #[arg(long, env = "SWITCHDECK_LEGACY_CUT")]
    legacy_cut_fallthrough: bool,

    /// Print the available MIDI ports and exit.
    #[arg(long)]
    list_ports: bool,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if any of the socket addresses cannot be parsed.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let device_addr: SocketAddr = self
            .device_addr
            .parse()
            .with_context(|| format!("invalid switcher address: '{}'", self.device_addr))?;
        let http_bind_addr: SocketAddr = self
            .http_bind
            .parse()
            .with_context(|| format!("invalid HTTP bind address: '{}'", self.http_bind))?;
        let ws_bind_addr: SocketAddr = self
            .ws_bind
            .parse()
            .with_context(|| format!("invalid WebSocket bind address: '{}'", self.ws_bind))?;

        Ok(BridgeConfig {
            device_addr,
            midi_input_port: self.midi_input_port,
            midi_output_port: self.midi_output_port,
            mappings_path: self.mappings,
            http_bind_addr,
            ws_bind_addr,
            public_dir: self.public_dir,
            index_file: self.index_file,
            cut_behavior: if self.legacy_cut_fallthrough {
                CutBehavior::CutThenAuto
            } else {
                CutBehavior::CutOnly
            },
        })
    }
}

fn print_ports() -> anyhow::Result<()> {
    println!("MIDI input ports:");
    for port in list_input_ports()? {
        println!("  {}: {}", port.index, port.name);
    }
    println!("MIDI output ports:");
    for port in list_output_ports()? {
        println!("  {}: {}", port.index, port.name);
    }
    Ok(())
}

fn log_ports() {
    match (list_input_ports(), list_output_ports()) {
        (Ok(inputs), Ok(outputs)) => {
            for port in inputs {
                info!("MIDI input {}: {}", port.index, port.name);
            }
            for port in outputs {
                info!("MIDI output {}: {}", port.index, port.name);
            }
        }
        (Err(e), _) | (_, Err(e)) => warn!("could not list MIDI ports: {e}"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Startup order: mappings, MIDI ports, switcher, servers, dispatch loop.
/// Any failure before the dispatch loop starts is fatal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.list_ports {
        return print_ports();
    }
    let config = cli.into_bridge_config()?;

    info!(
        "switchdeck starting: switcher={}, http={}, ws={}",
        config.device_addr, config.http_bind_addr, config.ws_bind_addr
    );
    if config.cut_behavior == CutBehavior::CutThenAuto {
        info!("legacy cut fall-through enabled: cut is followed by an auto transition");
    }

    // ── Mappings ──────────────────────────────────────────────────────────────
    let table = Arc::new(
        load_mapping_table(&config.mappings_path)
            .with_context(|| format!("cannot start without {}", config.mappings_path.display()))?,
    );

    // ── Control surface ───────────────────────────────────────────────────────
    log_ports();
    let (controller_tx, controller_rx) = mpsc::channel(CONTROLLER_QUEUE_DEPTH);
    let _input = open_input(config.midi_input_port, controller_tx)
        .context("failed to open MIDI input")?;
    let output = MidiOutputPort::open(config.midi_output_port)
        .context("failed to open MIDI output")?;

    // ── Switcher ──────────────────────────────────────────────────────────────
    let (switcher, device_rx) = SimulatedSwitcher::new();
    let device: Arc<dyn DeviceGateway> = Arc::new(switcher);
    device
        .connect(config.device_addr)
        .await
        .with_context(|| format!("failed to connect to switcher at {}", config.device_addr))?;

    // ── Shutdown flag ─────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Servers ───────────────────────────────────────────────────────────────
    let observers = ObserverBroadcast::default();

    let http_state = HttpState {
        mappings_path: config.mappings_path.clone(),
        index_file: config.index_file.clone(),
        public_dir: config.public_dir.clone(),
    };
    let http_bind_addr = config.http_bind_addr;
    let http_running = Arc::clone(&running);
    let http_task = tokio::spawn(async move {
        if let Err(e) = run_http_server(http_bind_addr, http_state, http_running).await {
            error!("{e:#}");
        }
    });

    let ws_hub = observers.clone();
    let ws_bind_addr = config.ws_bind_addr;
    let ws_running = Arc::clone(&running);
    let ws_task = tokio::spawn(async move {
        if let Err(e) = run_observer_server(ws_bind_addr, ws_hub, ws_running).await {
            error!("{e:#}");
        }
    });

    // ── Dispatch ──────────────────────────────────────────────────────────────
    let ctx = AppContext::new(
        table,
        device,
        Arc::new(output),
        Arc::new(observers),
        config.cut_behavior,
    );
    info!("switchdeck ready. Press Ctrl-C to exit.");
    let summary = run_dispatch_loop(&ctx, controller_rx, device_rx, Arc::clone(&running)).await;

    running.store(false, Ordering::Relaxed);
    let _ = tokio::join!(http_task, ws_task);

    info!(
        "switchdeck stopped after {} controller and {} switcher events",
        summary.controller_events, summary.device_events
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

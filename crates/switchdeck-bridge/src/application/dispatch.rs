//! The application context and its dispatch loop.
//!
//! Controller events and device events arrive on two channels and are handled
//! by a single consumer, one at a time and to completion.  Commands issued by
//! the translator therefore never interleave with a feedback pass, and events
//! from one source are handled in arrival order.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use switchdeck_core::{ControllerEvent, MappingTable};

use crate::application::ports::{ControllerOutput, DeviceEvent, DeviceGateway, ObserverSink};
use crate::application::sync_feedback::FeedbackSynchronizer;
use crate::application::translate_event::EventTranslator;
use crate::domain::CutBehavior;

/// How often the loop re-checks the shutdown flag when both channels are idle.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Everything the event handlers need, built once at startup.
pub struct AppContext {
    pub translator: EventTranslator,
    pub synchronizer: FeedbackSynchronizer,
}

impl AppContext {
    pub fn new(
        table: Arc<MappingTable>,
        device: Arc<dyn DeviceGateway>,
        controller: Arc<dyn ControllerOutput>,
        observers: Arc<dyn ObserverSink>,
        cut_behavior: CutBehavior,
    ) -> Self {
        let translator =
            EventTranslator::new(Arc::clone(&table), Arc::clone(&device), cut_behavior);
        let synchronizer = FeedbackSynchronizer::new(table, device, controller, observers);
        Self {
            translator,
            synchronizer,
        }
    }
}

/// Counters reported when the dispatch loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub controller_events: u64,
    pub device_events: u64,
}

/// Runs until `running` is cleared or both channels are closed.
pub async fn run_dispatch_loop(
    ctx: &AppContext,
    mut controller_rx: mpsc::Receiver<ControllerEvent>,
    mut device_rx: mpsc::Receiver<DeviceEvent>,
    running: Arc<AtomicBool>,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    let mut controller_open = true;
    let mut device_open = true;

    while controller_open || device_open {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping dispatch loop");
            break;
        }

        tokio::select! {
            event = controller_rx.recv(), if controller_open => match event {
                Some(event) => {
                    summary.controller_events += 1;
                    let outcome = ctx.translator.handle(event).await;
                    debug!("controller event {event:?} -> {outcome:?}");
                }
                None => {
                    info!("controller event channel closed");
                    controller_open = false;
                }
            },
            event = device_rx.recv(), if device_open => match event {
                Some(DeviceEvent::Connected { address }) => {
                    summary.device_events += 1;
                    info!("connected to switcher at {address}");
                }
                Some(DeviceEvent::StateChanged) => {
                    summary.device_events += 1;
                    let outcome = ctx.synchronizer.on_state_changed().await;
                    debug!("state changed -> {outcome:?}");
                }
                None => {
                    info!("device event channel closed");
                    device_open = false;
                }
            },
            _ = tokio::time::sleep(SHUTDOWN_POLL) => {}
        }
    }

    summary
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Application layer for switchdeck-bridge.
//!
//! Knows *what* to do with controller and switcher events, and delegates
//! *how* to the gateway traits in [`ports`].
//!
//! # Sub-modules
//!
//! - **`ports`** – The gateway traits (`DeviceGateway`, `ControllerOutput`,
//!   `ObserverSink`) and the events they emit.
//! - **`translate_event`** – Turns controller events into switcher commands.
//! - **`sync_feedback`** – Turns switcher state changes into LED and browser
//!   feedback.
//! - **`dispatch`** – The application context and the single-consumer loop
//!   that feeds both.

pub mod dispatch;
pub mod ports;
pub mod sync_feedback;
pub mod translate_event;

pub use dispatch::{run_dispatch_loop, AppContext, DispatchSummary};
pub use ports::{ControllerError, ControllerOutput, DeviceError, DeviceEvent, DeviceGateway, ObserverSink};
pub use sync_feedback::{FeedbackSynchronizer, SyncOutcome};
pub use translate_event::{EventTranslator, HandleOutcome};

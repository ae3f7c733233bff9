//! Music Visualizer Core - Zustandsmaschine und Kommando-Protokoll
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits für Strip, Status-LED und Update-Transport und die
//! komplette Logik: Kommando-Grammatik, LED-Arbiter, Update-Sequencer,
//! Liveness-Überwachung und den Scheduler-Tick.

#![no_std]

mod fmt;

pub mod arbiter;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod device;
pub mod effects;
pub mod http;
pub mod net;
pub mod protocol;
pub mod release;
pub mod serial;
pub mod timer;
pub mod traits;
pub mod types;
pub mod update;

// Re-exports für einfachen Zugriff
pub use arbiter::LedArbiter;
pub use command::{Command, CommandError, UpdateAction};
pub use config::DeviceInfo;
pub use connectivity::{ConnectivityMonitor, LinkChange};
pub use device::{Device, TickOutcome};
pub use effects::BeatSample;
pub use http::{ContentType, HttpReply, HttpRequest, Method, RouteError};
pub use net::{HttpUrl, PushHeader, ResponseHead};
pub use protocol::Response;
pub use release::{Release, ReleaseError};
pub use serial::{LineAssembler, LineError};
pub use traits::{
    Board, FlashError, LedError, ProgressSink, SmartLedWriter, StatusLed, TransportError,
    UpdateTransport,
};
pub use types::{DeviceState, LedMode, NamedColor};
pub use update::{
    FailureReason, PushError, PushEvent, UpdateError, UpdatePhase, UpdateResult, UpdateSequencer,
    UpdateSession, UpdateSource,
};

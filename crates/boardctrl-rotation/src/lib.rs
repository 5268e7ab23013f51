//! Slide rotation engine for boardctrl signage boards
//!
//! Given a board, the engine fetches its slides once, keeps the active ones in the
//! order the backend returned them, and cycles through them on a single display
//! surface until the session is stopped. Each slide stays on screen for its
//! configured duration before the surface is retargeted to the next one.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod config;
pub mod display;
pub mod error;
pub mod mock;
pub mod notify;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use config::{BoardCtrlConfig, PlaybackFailurePolicy, RotationConfig, SinkKind};
pub use display::{DisplayError, DisplaySink, DisplaySurface, FileSink, TracingSink, build_sink};
pub use error::{Result, RotationError};
pub use notify::{Notification, NotificationCenter, NotificationEvent, NotificationKind};
pub use service::{LoginRedirect, PresentOutcome, Presenter};
pub use session::{RotationHandle, SessionEnd, SessionState, SessionSummary, SlideCycle};

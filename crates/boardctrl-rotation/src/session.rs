//! Rotation sessions
//!
//! A session owns one display surface and a fixed snapshot of playable slides. A
//! single task waits out the current slide's duration, advances the cursor and
//! retargets the surface, then waits again. Cancellation is checked at that one wait.

use crate::config::PlaybackFailurePolicy;
use crate::display::{DisplayError, DisplaySurface};
use crate::notify::NotificationCenter;
use crate::{Result, RotationError};
use boardctrl_core::types::MIN_SLIDE_MINUTES;
use boardctrl_core::{BoardId, Slide, SlideId};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Circular cursor over a non-empty, fixed list of slides
#[derive(Debug, Clone)]
pub struct SlideCycle {
    slides: Vec<Slide>,
    index: usize,
}

impl SlideCycle {
    /// Start at the first slide, or `None` for an empty list
    pub fn new(slides: Vec<Slide>) -> Option<Self> {
        if slides.is_empty() {
            None
        } else {
            Some(Self { slides, index: 0 })
        }
    }

    /// Number of slides in the cycle
    pub const fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always `false`; a cycle is never empty
    pub const fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Position of the current slide
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Slide currently on screen
    #[allow(clippy::indexing_slicing)] // index < len, len > 0
    pub fn current(&self) -> &Slide {
        &self.slides[self.index]
    }

    /// Move to the next slide, wrapping after the last one
    pub fn advance(&mut self) -> &Slide {
        self.index = (self.index + 1) % self.slides.len();
        self.current()
    }

    /// How long the current slide stays on screen, at least one unit
    pub fn current_wait(&self, unit: Duration) -> Duration {
        unit.saturating_mul(self.current().duration_minutes.max(MIN_SLIDE_MINUTES))
    }
}

/// Snapshot of a running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Position of the cursor in the cycle
    ///
    /// After a rejected transition the cursor has moved on while the surface still
    /// shows `slide_id`.
    pub index: usize,
    /// Slide on screen
    pub slide_id: SlideId,
    /// URL on screen
    pub target: String,
    /// Successful transitions after the initial open
    pub navigations: u64,
    /// Transitions the surface rejected
    pub failures: u64,
}

impl SessionState {
    fn at(cycle: &SlideCycle) -> Self {
        let slide = cycle.current();
        Self {
            index: cycle.index(),
            slide_id: slide.id,
            target: slide.target.clone(),
            navigations: 0,
            failures: 0,
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Stopped through its handle
    Stopped,
    /// The display surface was closed from outside
    SurfaceClosed,
    /// A playback failure ended the session under the abort policy
    Aborted {
        /// Failure that ended the session
        reason: String,
    },
}

/// Final account of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Board that was shown
    pub board_id: BoardId,
    /// Successful transitions after the initial open
    pub navigations: u64,
    /// Transitions the surface rejected
    pub failures: u64,
    /// Why the session ended
    pub end: SessionEnd,
}

/// Settings a session runs with
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionSettings {
    pub(crate) time_unit: Duration,
    pub(crate) on_playback_failure: PlaybackFailurePolicy,
}

/// Control handle for a running rotation
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct RotationHandle {
    board_id: BoardId,
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
    task: Option<JoinHandle<SessionSummary>>,
}

impl RotationHandle {
    pub(crate) fn spawn(
        board_id: BoardId,
        cycle: SlideCycle,
        surface: Box<dyn DisplaySurface>,
        settings: SessionSettings,
        notifications: NotificationCenter,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state) = watch::channel(SessionState::at(&cycle));

        let session = Session {
            board_id,
            cycle,
            surface,
            settings,
            notifications,
            cancel: cancel.clone(),
            state: state_tx,
        };
        let span = info_span!("rotation", %board_id);
        let task = tokio::spawn(session.run().instrument(span));

        Self {
            board_id,
            cancel,
            state,
            task: Some(task),
        }
    }

    /// Board being shown
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Whether the session task has ended
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the session and wait for its task to end
    ///
    /// No navigation happens once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Shutdown`] if the session task panicked.
    pub async fn stop(mut self) -> Result<SessionSummary> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait until the session ends on its own
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Shutdown`] if the session task panicked.
    pub async fn wait(mut self) -> Result<SessionSummary> {
        self.join().await
    }

    async fn join(&mut self) -> Result<SessionSummary> {
        let task = self
            .task
            .take()
            .ok_or_else(|| RotationError::shutdown("rotation task already joined"))?;

        task.await
            .map_err(|e| RotationError::shutdown(format!("rotation task failed: {e}")))
    }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Session {
    board_id: BoardId,
    cycle: SlideCycle,
    surface: Box<dyn DisplaySurface>,
    settings: SessionSettings,
    notifications: NotificationCenter,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl Session {
    async fn run(mut self) -> SessionSummary {
        info!(slides = self.cycle.len(), "Rotation started");
        let mut state = SessionState::at(&self.cycle);

        let end = loop {
            let wait = self.cycle.current_wait(self.settings.time_unit);
            debug!(index = self.cycle.index(), ?wait, "Waiting for next transition");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break SessionEnd::Stopped,
                () = tokio::time::sleep(wait) => {}
            }

            self.cycle.advance();
            state.index = self.cycle.index();
            let slide_id = self.cycle.current().id;
            let target = self.cycle.current().target.clone();

            match self.surface.retarget(&target).await {
                Ok(()) => {
                    state.navigations += 1;
                    debug!(index = state.index, %slide_id, url = %target, "Transitioned");
                    state.slide_id = slide_id;
                    state.target = target;
                }
                Err(DisplayError::Closed) => {
                    info!("Display surface closed, ending rotation");
                    self.notifications.info("Display was closed, rotation ended");
                    break SessionEnd::SurfaceClosed;
                }
                Err(e) => {
                    state.failures += 1;
                    warn!(
                        index = state.index,
                        %slide_id,
                        url = %target,
                        on_screen = self.surface.current(),
                        error = %e,
                        "Slide failed to display"
                    );
                    self.notifications
                        .error(format!("Slide {slide_id} could not be displayed: {e}"));

                    if self.settings.on_playback_failure == PlaybackFailurePolicy::Abort {
                        break SessionEnd::Aborted {
                            reason: e.to_string(),
                        };
                    }
                }
            }

            self.state.send_replace(state.clone());
        };

        info!(
            navigations = state.navigations,
            failures = state.failures,
            ?end,
            "Rotation ended"
        );
        SessionSummary {
            board_id: self.board_id,
            navigations: state.navigations,
            failures: state.failures,
            end,
        }
    }
}

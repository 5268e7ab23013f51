//! Presentation service
//!
//! [`Presenter`] turns "show this board" into a running rotation: it fetches the slide
//! snapshot, filters it, opens the single display surface and hands the rest to a
//! session task. Every failure is reported through the notification center.

use crate::config::RotationConfig;
use crate::display::{DisplaySink, DisplaySurface};
use crate::notify::NotificationCenter;
use crate::session::{RotationHandle, SessionSettings, SlideCycle};
use crate::{Result, RotationError};
use async_trait::async_trait;
use boardctrl_client::{CredentialStore, SlideSource};
use boardctrl_core::BoardId;
use boardctrl_core::utils::{normalize_slide_url, playable_slides};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Entry point to return to once the session expired
#[async_trait]
pub trait LoginRedirect: Send + Sync {
    /// Send the operator back to sign-in
    async fn redirect_to_login(&self);
}

/// Result of a presentation request that did not fail
#[derive(Debug)]
pub enum PresentOutcome {
    /// A rotation is running
    Started(RotationHandle),
    /// The board has no slides
    NoSlides,
    /// The board has slides, but none can be shown
    NoActiveSlides,
}

impl PresentOutcome {
    /// Handle of the started rotation, if any
    pub fn into_handle(self) -> Option<RotationHandle> {
        match self {
            Self::Started(handle) => Some(handle),
            Self::NoSlides | Self::NoActiveSlides => None,
        }
    }
}

/// Starts rotations and previews on a display sink
pub struct Presenter {
    config: RotationConfig,
    source: Arc<dyn SlideSource>,
    credentials: Arc<dyn CredentialStore>,
    sink: Arc<dyn DisplaySink>,
    notifications: NotificationCenter,
    redirect: Arc<dyn LoginRedirect>,
    pending_redirect: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter")
            .field("config", &self.config)
            .field("sink", &self.sink)
            .field("redirect_pending", &self.pending_redirect.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl Presenter {
    /// Create a presenter
    pub fn new(
        config: RotationConfig,
        source: Arc<dyn SlideSource>,
        credentials: Arc<dyn CredentialStore>,
        sink: Arc<dyn DisplaySink>,
        notifications: NotificationCenter,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            config,
            source,
            credentials,
            sink,
            notifications,
            redirect,
            pending_redirect: Mutex::new(None),
        }
    }

    /// Notification center used for user-visible messages
    pub const fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Show a board: fetch its slides once and rotate through the active ones
    ///
    /// # Errors
    ///
    /// - [`RotationError::AuthExpired`] if the credential is missing or rejected; the
    ///   credential is cleared and a login redirect is scheduled.
    /// - [`RotationError::SlidesUnavailable`] if the listing failed otherwise.
    /// - [`RotationError::SurfaceUnavailable`] if the display surface could not be opened.
    #[instrument(skip_all, fields(board_id = %board_id))]
    pub async fn present(&self, board_id: BoardId) -> Result<PresentOutcome> {
        let slides = match self.source.list_slides(board_id).await {
            Ok(slides) => slides,
            Err(e) if e.is_auth() => {
                warn!(error = %e, "Slide listing rejected, session expired");
                self.expire_session().await;
                return Err(RotationError::AuthExpired);
            }
            Err(source) => {
                warn!(error = %source, "Slide listing failed");
                self.notifications.error("Slides not found");
                return Err(RotationError::SlidesUnavailable { board_id, source });
            }
        };

        if slides.is_empty() {
            info!("Board has no slides");
            self.notifications.error("No slides available for this board");
            return Ok(PresentOutcome::NoSlides);
        }

        let total = slides.len();
        let Some(cycle) = SlideCycle::new(playable_slides(slides)) else {
            info!(total, "Board has no active slides");
            self.notifications.error("No active slides available for this board");
            return Ok(PresentOutcome::NoActiveSlides);
        };

        let first = cycle.current();
        let surface = match self.sink.open(&first.target).await {
            Ok(surface) => surface,
            Err(source) => {
                warn!(
                    sink = self.sink.name(),
                    error = %source,
                    "Display surface could not be opened"
                );
                self.notifications
                    .error(format!("Display could not be opened: {source}"));
                return Err(RotationError::SurfaceUnavailable { source });
            }
        };

        info!(
            total,
            active = cycle.len(),
            first = %first.target,
            sink = self.sink.name(),
            "Presenting board"
        );

        let settings = SessionSettings {
            time_unit: self.config.time_unit(),
            on_playback_failure: self.config.on_playback_failure,
        };
        Ok(PresentOutcome::Started(RotationHandle::spawn(
            board_id,
            cycle,
            surface,
            settings,
            self.notifications.clone(),
        )))
    }

    /// Open a single URL on the sink without rotating
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Core`] for an unusable URL and
    /// [`RotationError::SurfaceUnavailable`] if the surface could not be opened.
    #[instrument(skip(self))]
    pub async fn preview(&self, url: &str) -> Result<Box<dyn DisplaySurface>> {
        let url = normalize_slide_url(url)?;

        self.sink.open(&url).await.map_err(|source| {
            self.notifications
                .error(format!("Display could not be opened: {source}"));
            RotationError::SurfaceUnavailable { source }
        })
    }

    /// Wait for a scheduled login redirect
    ///
    /// Returns `false` if none was pending.
    pub async fn await_redirect(&self) -> bool {
        let pending = self.pending_redirect.lock().take();
        let Some(task) = pending else {
            return false;
        };

        if let Err(e) = task.await {
            warn!(error = %e, "Login redirect task failed");
        }
        true
    }

    async fn expire_session(&self) {
        let delay = self.config.auth_redirect_delay();
        self.notifications.error(format!(
            "Session expired, redirecting to login in {} seconds",
            delay.as_secs()
        ));

        if let Err(e) = self.credentials.clear().await {
            warn!(error = %e, "Failed to clear stored credential");
        }

        let redirect = Arc::clone(&self.redirect);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Redirecting to login");
            redirect.redirect_to_login().await;
        });

        if let Some(previous) = self.pending_redirect.lock().replace(task) {
            previous.abort();
        }
    }
}

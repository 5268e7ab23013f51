//! Test doubles for the rotation engine collaborators

use crate::display::{DisplayError, DisplayResult, DisplaySink, DisplaySurface};
use crate::service::LoginRedirect;
use async_trait::async_trait;
use boardctrl_client::{ClientError, ClientResult, SlideSource};
use boardctrl_core::{BoardId, Slide};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

/// One recorded display command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Target URL
    pub url: String,
    /// When the command arrived
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Recording {
    opens: Vec<Navigation>,
    navigations: Vec<Navigation>,
    failed: Vec<Navigation>,
}

#[derive(Debug, Default)]
struct Script {
    refuse_open: Option<String>,
    failing_urls: HashSet<String>,
    close_after: Option<usize>,
}

/// Display sink that records every open and retarget
///
/// Clones share the same recording.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    recording: Arc<Mutex<Recording>>,
    script: Arc<Mutex<Script>>,
}

impl RecordingSink {
    /// Create a sink that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to open a surface
    pub fn refusing_open(self, reason: impl Into<String>) -> Self {
        self.script.lock().refuse_open = Some(reason.into());
        self
    }

    /// Fail every retarget to `url`
    pub fn failing_on(self, url: impl Into<String>) -> Self {
        self.script.lock().failing_urls.insert(url.into());
        self
    }

    /// Report the surface as closed once `navigations` retargets succeeded
    pub fn closing_after(self, navigations: usize) -> Self {
        self.script.lock().close_after = Some(navigations);
        self
    }

    /// Surfaces opened so far
    pub fn opens(&self) -> Vec<Navigation> {
        self.recording.lock().opens.clone()
    }

    /// Successful retargets so far
    pub fn navigations(&self) -> Vec<Navigation> {
        self.recording.lock().navigations.clone()
    }

    /// Retargets that were rejected
    pub fn failed(&self) -> Vec<Navigation> {
        self.recording.lock().failed.clone()
    }

    /// Every URL put on screen, opens first
    pub fn shown_urls(&self) -> Vec<String> {
        let recording = self.recording.lock();
        recording
            .opens
            .iter()
            .chain(&recording.navigations)
            .map(|n| n.url.clone())
            .collect()
    }
}

#[derive(Debug)]
struct RecordingSurface {
    current: String,
    recording: Arc<Mutex<Recording>>,
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl DisplaySink for RecordingSink {
    async fn open(&self, url: &str) -> DisplayResult<Box<dyn DisplaySurface>> {
        if let Some(reason) = self.script.lock().refuse_open.clone() {
            return Err(DisplayError::blocked(reason));
        }

        self.recording.lock().opens.push(Navigation {
            url: url.to_string(),
            at: Instant::now(),
        });

        Ok(Box::new(RecordingSurface {
            current: url.to_string(),
            recording: Arc::clone(&self.recording),
            script: Arc::clone(&self.script),
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[async_trait]
impl DisplaySurface for RecordingSurface {
    async fn retarget(&mut self, url: &str) -> DisplayResult<()> {
        let (fails, close_after) = {
            let script = self.script.lock();
            (script.failing_urls.contains(url), script.close_after)
        };

        let mut recording = self.recording.lock();
        if close_after.is_some_and(|limit| recording.navigations.len() >= limit) {
            return Err(DisplayError::Closed);
        }

        let navigation = Navigation {
            url: url.to_string(),
            at: Instant::now(),
        };
        if fails {
            recording.failed.push(navigation);
            return Err(DisplayError::navigation(url, "scripted failure"));
        }

        recording.navigations.push(navigation);
        url.clone_into(&mut self.current);
        Ok(())
    }

    fn current(&self) -> &str {
        &self.current
    }
}

#[derive(Debug, Clone, Copy)]
enum Reply {
    Slides,
    Unauthorized,
    NotAuthenticated,
    Unavailable,
}

/// Slide source answering from a fixed list
#[derive(Debug)]
pub struct StaticSlideSource {
    slides: Vec<Slide>,
    reply: Reply,
    calls: AtomicUsize,
}

impl StaticSlideSource {
    /// Answer every board with `slides`
    pub const fn new(slides: Vec<Slide>) -> Self {
        Self::replying(slides, Reply::Slides)
    }

    /// Reject the stored credential
    pub const fn unauthorized() -> Self {
        Self::replying(Vec::new(), Reply::Unauthorized)
    }

    /// Behave as if no credential is stored
    pub const fn not_authenticated() -> Self {
        Self::replying(Vec::new(), Reply::NotAuthenticated)
    }

    /// Fail with a transport error
    pub const fn unavailable() -> Self {
        Self::replying(Vec::new(), Reply::Unavailable)
    }

    const fn replying(slides: Vec<Slide>, reply: Reply) -> Self {
        Self {
            slides,
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of listing requests served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlideSource for StaticSlideSource {
    async fn list_slides(&self, _board: BoardId) -> ClientResult<Vec<Slide>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Slides => Ok(self.slides.clone()),
            Reply::Unauthorized => Err(ClientError::Unauthorized),
            Reply::NotAuthenticated => Err(ClientError::NotAuthenticated),
            Reply::Unavailable => Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "backend unreachable",
            ))),
        }
    }
}

/// Login redirect that records when it fired
#[derive(Debug, Clone, Default)]
pub struct RecordingRedirect {
    fired: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingRedirect {
    /// Create a redirect recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the redirect fired
    pub fn fired(&self) -> Vec<Instant> {
        self.fired.lock().clone()
    }
}

#[async_trait]
impl LoginRedirect for RecordingRedirect {
    async fn redirect_to_login(&self) {
        self.fired.lock().push(Instant::now());
    }
}

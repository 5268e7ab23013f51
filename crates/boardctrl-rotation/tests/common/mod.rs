//! Shared fixtures for rotation engine tests
#![allow(dead_code)]

use boardctrl_client::{CredentialStore, MemoryCredentialStore, SlideSource};
use boardctrl_core::{BoardId, Slide, SlideId};
use boardctrl_rotation::mock::{RecordingRedirect, RecordingSink};
use boardctrl_rotation::{
    NotificationCenter, PlaybackFailurePolicy, Presenter, RotationConfig,
};
use std::sync::Arc;
use std::time::Duration;

/// One duration unit in tests
pub const UNIT: Duration = Duration::from_secs(1);

pub const BOARD: BoardId = BoardId(7);

pub fn slide(id: i64, target: &str, minutes: u32, active: bool) -> Slide {
    Slide {
        id: SlideId(id),
        title: format!("Slide {id}"),
        target: target.to_string(),
        duration_minutes: minutes,
        active,
        board_id: BOARD,
    }
}

pub fn units(n: u32) -> Duration {
    UNIT * n
}

/// Presenter wired to recording collaborators
pub struct Harness {
    pub presenter: Presenter,
    pub sink: RecordingSink,
    pub redirect: RecordingRedirect,
    pub credentials: Arc<MemoryCredentialStore>,
    pub notifications: NotificationCenter,
}

impl Harness {
    pub fn new(source: Arc<dyn SlideSource>, sink: RecordingSink) -> Self {
        Self::with_policy(source, sink, PlaybackFailurePolicy::Continue)
    }

    pub fn with_policy(
        source: Arc<dyn SlideSource>,
        sink: RecordingSink,
        policy: PlaybackFailurePolicy,
    ) -> Self {
        let config = RotationConfig {
            time_unit_ms: u64::try_from(UNIT.as_millis()).unwrap(),
            auth_redirect_delay_seconds: 5,
            on_playback_failure: policy,
        };
        let credentials = Arc::new(MemoryCredentialStore::with_token("token", "operator"));
        let redirect = RecordingRedirect::new();
        let notifications = NotificationCenter::default();

        let presenter = Presenter::new(
            config,
            source,
            Arc::clone(&credentials) as Arc<dyn CredentialStore>,
            Arc::new(sink.clone()),
            notifications.clone(),
            Arc::new(redirect.clone()),
        );

        Self {
            presenter,
            sink,
            redirect,
            credentials,
            notifications,
        }
    }

    /// Messages of the notifications currently visible
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .active()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}

//! Transient, auto-dismissing user notifications
//!
//! Every user-visible message (session expired, no slides, playback failures) goes
//! through a [`NotificationCenter`]. Subscribers receive [`NotificationEvent`]s; the
//! center removes each notification again after the configured visibility window.

use crate::config::NotificationConfig;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral information
    Info,
    /// An operation completed
    Success,
    /// An operation failed
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A message shown to the operator for a short time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// Severity
    pub kind: NotificationKind,
    /// Text shown to the operator
    pub message: String,
    /// When the notification was posted
    pub created_at: DateTime<Utc>,
}

/// Change in the set of visible notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A notification became visible
    Shown(Notification),
    /// A notification was removed
    Dismissed(Uuid),
}

#[derive(Debug)]
struct Inner {
    active: RwLock<Vec<Notification>>,
    events: broadcast::Sender<NotificationEvent>,
    dismiss_after: Duration,
}

impl Inner {
    fn dismiss(&self, id: Uuid) -> bool {
        let removed = {
            let mut active = self.active.write();
            let before = active.len();
            active.retain(|n| n.id != id);
            active.len() != before
        };

        if removed {
            debug!(%id, "Notification dismissed");
            // No subscribers is fine
            let _ = self.events.send(NotificationEvent::Dismissed(id));
        }
        removed
    }
}

/// Hub for transient notifications
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Create a notification center
    pub fn new(config: &NotificationConfig) -> Self {
        let (events, _) = broadcast::channel(config.capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                active: RwLock::new(Vec::new()),
                events,
                dismiss_after: config.dismiss_after(),
            }),
        }
    }

    /// Subscribe to notification events
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }

    /// How long each notification stays visible
    pub fn dismiss_after(&self) -> Duration {
        self.inner.dismiss_after
    }

    /// Post a notification and schedule its dismissal
    ///
    /// Outside a tokio runtime the notification stays until dismissed manually.
    pub fn post(&self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };

        match kind {
            NotificationKind::Error => warn!(id = %notification.id, message = %notification.message, "Notification"),
            _ => info!(id = %notification.id, %kind, message = %notification.message, "Notification"),
        }

        self.inner.active.write().push(notification.clone());
        let _ = self
            .inner
            .events
            .send(NotificationEvent::Shown(notification.clone()));

        self.schedule_dismissal(notification.id);
        notification
    }

    /// Post an informational notification
    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.post(NotificationKind::Info, message)
    }

    /// Post a success notification
    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.post(NotificationKind::Success, message)
    }

    /// Post an error notification
    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.post(NotificationKind::Error, message)
    }

    /// Remove a notification before its window elapses
    ///
    /// Returns `false` if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        self.inner.dismiss(id)
    }

    /// Currently visible notifications, oldest first
    pub fn active(&self) -> Vec<Notification> {
        self.inner.active.read().clone()
    }

    fn schedule_dismissal(&self, id: Uuid) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(%id, "No runtime, notification will not auto-dismiss");
            return;
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let window = self.inner.dismiss_after;
        runtime.spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = inner.upgrade() {
                inner.dismiss(id);
            }
        });
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(&NotificationConfig::default())
    }
}

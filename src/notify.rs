//! Notification center
//!
//! Processing, success and error messages for long-running operations.
//! At most one final message is shown at a time, and a processing message
//! is dismissed before its final message is posted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct NotificationCenter {
    next_id: AtomicU64,
    active: Mutex<Vec<Notification>>,
    posted: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn post(&self, kind: NotificationKind, message: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let notification = Notification {
            id,
            kind,
            message: message.to_string(),
            posted_at: Utc::now(),
        };

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if kind != NotificationKind::Processing {
            active.retain(|n| n.kind == NotificationKind::Processing);
        }
        active.push(notification.clone());
        drop(active);

        self.posted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        id
    }

    /// Show a processing message until it is dismissed
    pub fn processing(&self, message: &str) -> u64 {
        info!(notice = message, "Processing");
        self.post(NotificationKind::Processing, message)
    }

    pub fn success(&self, message: &str) -> u64 {
        info!(notice = message, "Success");
        self.post(NotificationKind::Success, message)
    }

    pub fn error(&self, message: &str) -> u64 {
        error!(notice = message, "Error");
        self.post(NotificationKind::Error, message)
    }

    pub fn dismiss(&self, id: u64) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|n| n.id != id);
    }

    /// Notifications currently shown
    pub fn active(&self) -> Vec<Notification> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Every notification posted, oldest first
    pub fn history(&self) -> Vec<Notification> {
        self.posted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

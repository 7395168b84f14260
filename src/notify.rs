use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Mirrors the browser Notification permission states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Default,
}

impl Permission {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

/// Delivery gate for reminders. Anything but `granted` turns emission
/// into a silent no-op; delivered items queue up until the page polls
/// them and hands them to the browser Notification API.
#[derive(Debug, Default)]
pub struct Notifier {
    permission: Mutex<Permission>,
    outbox: Mutex<VecDeque<Notification>>,
}

impl Default for Permission {
    fn default() -> Self {
        Self::Default
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn permission(&self) -> Permission {
        *self.permission.lock().await
    }

    pub async fn set_permission(&self, permission: Permission) {
        info!("notification permission set to {permission:?}");
        *self.permission.lock().await = permission;
    }

    /// Returns whether the notification was actually queued.
    pub async fn send(&self, notification: Notification) -> bool {
        if *self.permission.lock().await != Permission::Granted {
            debug!("suppressed notification (permission not granted): {}", notification.title);
            return false;
        }

        info!("notification: {}: {}", notification.title, notification.body);
        self.outbox.lock().await.push_back(notification);
        true
    }

    pub async fn drain(&self) -> Vec<Notification> {
        self.outbox.lock().await.drain(..).collect()
    }
}

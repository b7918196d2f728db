//! Notification bus
//!
//! Forms report outcomes (errors, warnings, successes, session changes) as
//! fire-and-forget notifications. Any number of listeners can subscribe; a
//! publish with nobody listening is dropped.

use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel
const CHANNEL_CAPACITY: usize = 256;

/// A user-facing event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    Error(String),
    Warning(String),
    Success(String),
    SignedOut,
}

impl Notification {
    /// Event name as listeners know it
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Error(_) => "error",
            Notification::Warning(_) => "warning",
            Notification::Success(_) => "success",
            Notification::SignedOut => "signed_out",
        }
    }

    /// Text of an error, warning or success
    pub fn message(&self) -> Option<&str> {
        match self {
            Notification::Error(msg) | Notification::Warning(msg) | Notification::Success(msg) => {
                Some(msg)
            }
            Notification::SignedOut => None,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{}: {}", self.kind(), msg),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Broadcasts notifications to every subscriber
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Receive every notification published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish a notification
    pub fn publish(&self, notification: Notification) {
        tracing::debug!(kind = notification.kind(), "publishing notification");
        // No receivers is fine.
        let _ = self.tx.send(notification);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notification::Error(message.into()));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.publish(Notification::Warning(message.into()));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notification::Success(message.into()));
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain everything a receiver has buffered
pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => out.push(notification),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notification receiver lagged");
            }
            Err(_) => break,
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = NotificationBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        bus.error("nobody listening");
    }

    #[test]
    fn test_every_subscriber_receives() {
        let bus = NotificationBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.success("Saved customer");
        bus.publish(Notification::SignedOut);

        assert_eq!(
            drain(&mut a),
            vec![
                Notification::Success("Saved customer".into()),
                Notification::SignedOut
            ]
        );
        assert_eq!(drain(&mut b).len(), 2);
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(Notification::Warning("w".into()).to_string(), "warning: w");
        assert_eq!(Notification::SignedOut.to_string(), "signed_out");
        assert_eq!(Notification::SignedOut.message(), None);
    }

    #[test]
    fn test_notification_serializes() {
        assert_eq!(
            serde_json::to_value(Notification::Error("x".into())).unwrap(),
            json!({"kind": "error", "payload": "x"})
        );
    }
}

//! Outbound notifications.
//!
//! Operations queue messages in an [`Outbox`] while their unit of work is open.
//! The outbox is handed to a [`Notifier`] only after the commit succeeds, and
//! delivery failures are logged rather than returned.

use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport refused or dropped the message
    #[error("Failed to deliver '{subject}' to {recipient}: {reason}")]
    Delivery {
        recipient: String,
        subject: String,
        reason: String,
    },
}

/// Delivery channel for user-facing messages (email in production)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, message: &str)
    -> Result<(), NotifyError>;
}

/// One queued message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub message: String,
}

/// Messages waiting for their unit of work to commit
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.pending.push(Notification {
            recipient: recipient.into(),
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter()
    }

    /// Deliver every queued message, returning how many were accepted
    pub async fn dispatch(self, notifier: &dyn Notifier) -> usize {
        let mut delivered = 0;
        for n in self.pending {
            match notifier.notify(&n.recipient, &n.subject, &n.message).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Notification dropped: {e}"),
            }
        }
        delivered
    }
}

/// Writes every notification to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        info!("[notify] to={recipient} subject=\"{subject}\" {message}");
        Ok(())
    }
}

/// Keeps delivered notifications in memory for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Delivered notifications with the given subject
    pub async fn with_subject(&self, subject: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.subject == subject)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().await.push(Notification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenNotifier;

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn notify(
            &self,
            recipient: &str,
            subject: &str,
            _message: &str,
        ) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                reason: "smtp down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_order() {
        let notifier = RecordingNotifier::new();
        let mut outbox = Outbox::new();
        outbox.push("a@example.com", "Match Created", "first");
        outbox.push("b@example.com", "Match Created", "second");

        assert_eq!(outbox.dispatch(&notifier).await, 2);

        let sent = notifier.sent().await;
        assert_eq!(sent[0].recipient, "a@example.com");
        assert_eq!(sent[1].message, "second");
    }

    #[tokio::test]
    async fn test_delivery_failures_are_swallowed() {
        let mut outbox = Outbox::new();
        outbox.push("a@example.com", "Request Accepted", "hello");

        assert_eq!(outbox.dispatch(&BrokenNotifier).await, 0);
    }
}

//! Outbound notifications.
//!
//! Services talk to a [`NotificationGateway`] so they never depend on a
//! particular mail transport.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use sweater_common::AppResult;

/// Sends a plain-text message to an address.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Deliver `body` with `subject` to `address`.
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Shared notification gateway.
pub type NotificationGatewayService = Arc<dyn NotificationGateway>;

/// Gateway used when outgoing mail is not configured.
#[derive(Clone, Default)]
pub struct NoOpNotificationGateway;

#[async_trait]
impl NotificationGateway for NoOpNotificationGateway {
    async fn send(&self, address: &str, subject: &str, _body: &str) -> AppResult<()> {
        tracing::debug!(to = %address, subject = %subject, "Mail disabled, dropping notification");
        Ok(())
    }
}

/// What happened to the activation notification of an operation.
///
/// Delivery failures never fail the operation itself; they are reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// The gateway accepted the message.
    Sent,
    /// No notification was needed.
    Skipped,
    /// The gateway rejected the message.
    Failed(String),
}

impl NotificationOutcome {
    /// Whether a delivery was attempted.
    #[must_use]
    pub const fn attempted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

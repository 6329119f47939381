//! Subscription service.

use serde::Serialize;
use sweater_common::{AppError, AppResult, Config};

use super::store::{Account, AccountStoreService};

/// Counters and viewer flags for a channel page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub subscribers_count: usize,
    pub subscriptions_count: usize,
    pub is_current_user: bool,
    pub is_subscriber: bool,
}

/// Maintains the subscriber relation between accounts.
#[derive(Clone)]
pub struct SubscriptionService {
    store: AccountStoreService,
    allow_self: bool,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(store: AccountStoreService, config: &Config) -> Self {
        Self {
            store,
            allow_self: config.subscriptions.allow_self,
        }
    }

    /// Add `follower` to the subscribers of `target`.
    ///
    /// Subscribing twice leaves a single membership.
    pub async fn subscribe(&self, follower: &Account, mut target: Account) -> AppResult<Account> {
        if !self.allow_self && follower.id == target.id {
            return Err(AppError::BadRequest(
                "Cannot subscribe to yourself".to_string(),
            ));
        }

        if target.subscribers.insert(follower.id.clone()) {
            tracing::debug!(subscriber = %follower.id, channel = %target.id, "Subscribed");
        }

        self.store.save(target).await
    }

    /// Remove `follower` from the subscribers of `target`.
    ///
    /// Removing an account that is not subscribed is a no-op.
    pub async fn unsubscribe(&self, follower: &Account, mut target: Account) -> AppResult<Account> {
        if target.subscribers.remove(&follower.id) {
            tracing::debug!(subscriber = %follower.id, channel = %target.id, "Unsubscribed");
        }

        self.store.save(target).await
    }

    /// Channel counters as seen by `viewer`.
    #[must_use]
    pub fn channel_stats(&self, viewer: &Account, channel: &Account) -> ChannelStats {
        ChannelStats {
            subscribers_count: channel.subscribers.len(),
            subscriptions_count: channel.subscriptions.len(),
            is_current_user: viewer.id == channel.id,
            is_subscriber: channel.subscribers.contains(&viewer.id),
        }
    }
}

//! User subscription repository.

use std::sync::Arc;

use crate::entities::{UserSubscription, user_subscription};
use sweater_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Repository for the subscriber relation between users.
///
/// Edges are written through [`crate::repositories::UserRepository::save_with_subscriber_changes`];
/// this repository only reads them.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// IDs of the users subscribed to a channel.
    pub async fn find_subscriber_ids(&self, channel_id: &str) -> AppResult<Vec<String>> {
        UserSubscription::find()
            .filter(user_subscription::Column::ChannelId.eq(channel_id))
            .order_by_asc(user_subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map(|edges| edges.into_iter().map(|e| e.subscriber_id).collect())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the channels a user is subscribed to.
    pub async fn find_subscription_ids(&self, subscriber_id: &str) -> AppResult<Vec<String>> {
        UserSubscription::find()
            .filter(user_subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_asc(user_subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map(|edges| edges.into_iter().map(|e| e.channel_id).collect())
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_edge(channel_id: &str, subscriber_id: &str) -> user_subscription::Model {
        user_subscription::Model {
            channel_id: channel_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_subscription_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_edge("channel1", "user1"),
                    create_test_edge("channel2", "user1"),
                ]])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let ids = repo.find_subscription_ids("user1").await.unwrap();
        assert_eq!(ids, vec!["channel1".to_string(), "channel2".to_string()]);
    }

    #[tokio::test]
    async fn test_find_subscriber_ids_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_subscription::Model>::new()])
                .into_connection(),
        );

        let repo = SubscriptionRepository::new(db);
        let ids = repo.find_subscriber_ids("channel1").await.unwrap();
        assert!(ids.is_empty());
    }
}

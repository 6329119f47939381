//! User repository.

use std::sync::Arc;

use crate::entities::{User, UserSubscription, user, user_subscription};
use sweater_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::OnConflict,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by exact (case-sensitive) username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user holding a pending activation code.
    pub async fn find_by_activation_code(&self, code: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::ActivationCode.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all users, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or update a user row and apply subscriber edge changes.
    ///
    /// Runs in a single transaction. Only the listed edges are touched:
    /// `added` edges are inserted unless already present and `removed` edges
    /// are deleted, leaving every other edge of the channel as it is.
    pub async fn save_with_subscriber_changes(
        &self,
        model: user::Model,
        added: &[String],
        removed: &[String],
    ) -> AppResult<user::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let exists = User::find_by_id(model.id.as_str())
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some();

        let mut active = model.into_active_model().reset_all();
        let saved = if exists {
            active.updated_at = Set(Some(chrono::Utc::now().into()));
            active.update(&txn).await
        } else {
            active.insert(&txn).await
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        if !removed.is_empty() {
            UserSubscription::delete_many()
                .filter(user_subscription::Column::ChannelId.eq(saved.id.as_str()))
                .filter(user_subscription::Column::SubscriberId.is_in(removed.iter().cloned()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !added.is_empty() {
            let now = chrono::Utc::now();
            let edges = added.iter().map(|subscriber_id| user_subscription::ActiveModel {
                channel_id: Set(saved.id.clone()),
                subscriber_id: Set(subscriber_id.clone()),
                created_at: Set(now.into()),
            });

            UserSubscription::insert_many(edges)
                .on_conflict(
                    OnConflict::columns([
                        user_subscription::Column::ChannelId,
                        user_subscription::Column::SubscriberId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(saved)
    }
}

//! Message repository.

use std::sync::Arc;

use crate::entities::{Message, message};
use sweater_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<message::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::MessageNotFound(id.to_string()))
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a message.
    pub async fn update(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all messages, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<message::Model>> {
        Message::find()
            .order_by_desc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get messages carrying exactly `tag`, newest first.
    pub async fn find_by_tag(&self, tag: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::Tag.eq(tag))
            .order_by_desc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get messages written by a user, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::AuthorId.eq(author_id))
            .order_by_desc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_message(id: &str, author_id: &str, tag: Option<&str>) -> message::Model {
        message::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            text: "Hello".to_string(),
            tag: tag.map(ToString::to_string),
            filename: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message::Model>::new()])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        match repo.get_by_id("missing").await {
            Err(AppError::MessageNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected MessageNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_tag() {
        let m1 = create_test_message("m2", "user1", Some("rust"));
        let m2 = create_test_message("m1", "user2", Some("rust"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.find_by_tag("rust").await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.tag.as_deref() == Some("rust")));
    }

    #[tokio::test]
    async fn test_find_by_author() {
        let m1 = create_test_message("m1", "user1", None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.find_by_author("user1").await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].author_id, "user1");
    }

    #[tokio::test]
    async fn test_create_message() {
        let message = create_test_message("m1", "user1", Some("news"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let active = message::ActiveModel {
            id: Set("m1".to_string()),
            author_id: Set("user1".to_string()),
            text: Set("Hello".to_string()),
            tag: Set(Some("news".to_string())),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.tag.as_deref(), Some("news"));
    }
}

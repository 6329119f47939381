//! Message service.

use std::sync::Arc;

use sea_orm::Set;
use serde::Deserialize;
use sweater_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use sweater_db::{entities::message, repositories::MessageRepository};
use validator::Validate;

use super::store::Account;

/// A file uploaded together with a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// File name as supplied by the client.
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Input for posting a message.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageInput {
    #[validate(length(min = 1, max = 2048))]
    pub text: String,

    #[validate(length(max = 255))]
    pub tag: Option<String>,
}

/// Input for editing a message. Empty fields keep the current value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMessageInput {
    #[validate(length(max = 2048))]
    pub text: Option<String>,

    #[validate(length(max = 255))]
    pub tag: Option<String>,
}

/// Message service for business logic.
#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl MessageService {
    /// Create a new message service.
    #[must_use]
    pub fn new(message_repo: MessageRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            message_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a message as `author`.
    pub async fn post(
        &self,
        author: &Account,
        input: CreateMessageInput,
        attachment: Option<Attachment>,
    ) -> AppResult<message::Model> {
        input.validate()?;

        let filename = self.store_attachment(attachment).await?;

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author.id.clone()),
            text: Set(input.text),
            tag: Set(input.tag.filter(|t| !t.is_empty())),
            filename: Set(filename),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let message = self.message_repo.create(model).await?;
        tracing::debug!(message_id = %message.id, author_id = %author.id, "Posted message");
        Ok(message)
    }

    /// All messages, newest first.
    pub async fn list(&self) -> AppResult<Vec<message::Model>> {
        self.message_repo.find_all().await
    }

    /// Messages with exactly `tag`. An absent or empty tag lists everything.
    pub async fn filter(&self, tag: Option<&str>) -> AppResult<Vec<message::Model>> {
        match tag.filter(|t| !t.is_empty()) {
            Some(tag) => self.message_repo.find_by_tag(tag).await,
            None => self.message_repo.find_all().await,
        }
    }

    /// Messages written by `author_id`, newest first.
    pub async fn by_author(&self, author_id: &str) -> AppResult<Vec<message::Model>> {
        self.message_repo.find_by_author(author_id).await
    }

    /// Edit a message. Only its author may do so.
    ///
    /// A new attachment replaces the stored one, whose file is then deleted.
    pub async fn update(
        &self,
        editor: &Account,
        message_id: &str,
        input: UpdateMessageInput,
        attachment: Option<Attachment>,
    ) -> AppResult<message::Model> {
        input.validate()?;

        let message = self.message_repo.get_by_id(message_id).await?;
        if message.author_id != editor.id {
            return Err(AppError::Forbidden(
                "Only the author can edit this message".to_string(),
            ));
        }

        let filename = self.store_attachment(attachment).await?;
        let replaced = filename.as_ref().and(message.filename.clone());

        let mut active: message::ActiveModel = message.into();

        if let Some(text) = input.text.filter(|t| !t.is_empty()) {
            active.text = Set(text);
        }
        if let Some(tag) = input.tag.filter(|t| !t.is_empty()) {
            active.tag = Set(Some(tag));
        }
        if filename.is_some() {
            active.filename = Set(filename);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let message = self.message_repo.update(active).await?;

        if let Some(old) = replaced {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!(error = %e, file = %old, "Failed to delete replaced attachment");
            }
        }

        Ok(message)
    }

    /// Public URL of a stored attachment.
    #[must_use]
    pub fn attachment_url(&self, filename: &str) -> String {
        self.storage.public_url(filename)
    }

    /// Write the attachment to storage, returning its stored name.
    ///
    /// Attachments without a file name are ignored.
    async fn store_attachment(&self, attachment: Option<Attachment>) -> AppResult<Option<String>> {
        let Some(attachment) = attachment.filter(|a| !a.original_name.is_empty()) else {
            return Ok(None);
        };

        let key = generate_storage_key(&attachment.original_name);
        let uploaded = self
            .storage
            .upload(&key, &attachment.data, &attachment.content_type)
            .await?;

        Ok(Some(uploaded.key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::testing::create_test_account;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Mutex;
    use sweater_common::UploadedFile;

    #[derive(Default)]
    struct MemoryStorage {
        keys: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }
    }

    fn create_test_message(id: &str, author_id: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            text: "Hello".to_string(),
            tag: Some("greeting".to_string()),
            filename: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(
        db: sea_orm::DatabaseConnection,
        storage: Arc<MemoryStorage>,
    ) -> MessageService {
        MessageService::new(MessageRepository::new(Arc::new(db)), storage)
    }

    fn insert_result() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_post_validation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = create_test_service(db, Arc::new(MemoryStorage::default()));
        let author = create_test_account("u1", "alice");

        let empty = CreateMessageInput {
            text: String::new(),
            tag: None,
        };
        assert!(matches!(
            service.post(&author, empty, None).await,
            Err(AppError::Validation(_))
        ));

        let long_tag = CreateMessageInput {
            text: "Hello".to_string(),
            tag: Some("t".repeat(256)),
        };
        assert!(matches!(
            service.post(&author, long_tag, None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_post_stores_attachment() {
        let mut stored = create_test_message("m1", "u1");
        stored.filename = Some("stored.cat.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored]])
            .append_exec_results([insert_result()])
            .into_connection();
        let storage = Arc::new(MemoryStorage::default());
        let service = create_test_service(db, storage.clone());

        let input = CreateMessageInput {
            text: "Hello".to_string(),
            tag: Some("greeting".to_string()),
        };
        let attachment = Attachment {
            original_name: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };

        let message = service
            .post(&create_test_account("u1", "alice"), input, Some(attachment))
            .await
            .unwrap();

        assert_eq!(message.author_id, "u1");
        let keys = storage.keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with(".cat.png"));
    }

    #[tokio::test]
    async fn test_post_ignores_unnamed_attachment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_message("m1", "u1")]])
            .append_exec_results([insert_result()])
            .into_connection();
        let storage = Arc::new(MemoryStorage::default());
        let service = create_test_service(db, storage.clone());

        let input = CreateMessageInput {
            text: "Hello".to_string(),
            tag: None,
        };
        let attachment = Attachment {
            original_name: String::new(),
            content_type: "application/octet-stream".to_string(),
            data: vec![],
        };

        service
            .post(&create_test_account("u1", "alice"), input, Some(attachment))
            .await
            .unwrap();

        assert!(storage.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_message("m1", "u1")]])
            .into_connection();
        let storage = Arc::new(MemoryStorage::default());
        let service = create_test_service(db, storage.clone());

        let input = UpdateMessageInput {
            text: Some("Hijacked".to_string()),
            tag: None,
        };

        let result = service
            .update(&create_test_account("u2", "bob"), "m1", input, None)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(storage.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_message() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<message::Model>::new()])
            .into_connection();
        let service = create_test_service(db, Arc::new(MemoryStorage::default()));

        let result = service
            .update(
                &create_test_account("u1", "alice"),
                "missing",
                UpdateMessageInput::default(),
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::MessageNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_by_author() {
        let original = create_test_message("m1", "u1");
        let mut updated = original.clone();
        updated.text = "Edited".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[original]])
            .append_query_results([[updated]])
            .append_exec_results([insert_result()])
            .into_connection();
        let service = create_test_service(db, Arc::new(MemoryStorage::default()));

        let input = UpdateMessageInput {
            text: Some("Edited".to_string()),
            tag: Some(String::new()),
        };
        let message = service
            .update(&create_test_account("u1", "alice"), "m1", input, None)
            .await
            .unwrap();

        assert_eq!(message.text, "Edited");
        assert_eq!(message.tag.as_deref(), Some("greeting"));
    }

    #[tokio::test]
    async fn test_update_with_attachment_deletes_replaced_file() {
        let mut original = create_test_message("m1", "u1");
        original.filename = Some("old.cat.png".to_string());
        let mut updated = original.clone();
        updated.filename = Some("new.dog.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[original]])
            .append_query_results([[updated]])
            .append_exec_results([insert_result()])
            .into_connection();
        let storage = Arc::new(MemoryStorage::default());
        let service = create_test_service(db, storage.clone());

        let attachment = Attachment {
            original_name: "dog.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1],
        };
        service
            .update(
                &create_test_account("u1", "alice"),
                "m1",
                UpdateMessageInput::default(),
                Some(attachment),
            )
            .await
            .unwrap();

        assert_eq!(storage.keys.lock().unwrap().len(), 1);
        assert_eq!(*storage.deleted.lock().unwrap(), vec!["old.cat.png".to_string()]);
    }

    #[tokio::test]
    async fn test_update_without_attachment_keeps_file() {
        let mut original = create_test_message("m1", "u1");
        original.filename = Some("old.cat.png".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[original.clone()]])
            .append_query_results([[original]])
            .append_exec_results([insert_result()])
            .into_connection();
        let storage = Arc::new(MemoryStorage::default());
        let service = create_test_service(db, storage.clone());

        service
            .update(
                &create_test_account("u1", "alice"),
                "m1",
                UpdateMessageInput::default(),
                None,
            )
            .await
            .unwrap();

        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_empty_tag_lists_all() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                create_test_message("m2", "u1"),
                create_test_message("m1", "u2"),
            ]])
            .into_connection();
        let service = create_test_service(db, Arc::new(MemoryStorage::default()));

        let messages = service.filter(Some("")).await.unwrap();
        assert_eq!(messages.len(), 2);
    }
}

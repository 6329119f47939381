//! Account aggregate and its persistence boundary.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sweater_common::AppResult;
use sweater_db::{
    entities::user::{self, Role},
    repositories::{SubscriptionRepository, UserRepository},
};

/// A registered account with its roles and subscription sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// Credential hash, never the raw password.
    pub password: String,
    pub email: Option<String>,
    pub active: bool,
    pub activation_code: Option<String>,
    pub roles: BTreeSet<Role>,
    /// Accounts following this one. Changes are written by [`AccountStore::save`].
    pub subscribers: BTreeSet<String>,
    /// Accounts this one follows. Derived on load, ignored by `save`.
    pub subscriptions: BTreeSet<String>,
    pub token: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// Subscriber set as last read from or written to the store.
    loaded_subscribers: BTreeSet<String>,
}

/// Subscriber edges added or removed since an [`Account`] was loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SubscriberChanges {
    /// Whether no edge changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl Account {
    /// A fresh, active account holding the `USER` role and no subscribers.
    #[must_use]
    pub fn new(id: String, username: String, password: String) -> Self {
        Self {
            id,
            username,
            password,
            email: None,
            active: true,
            activation_code: None,
            roles: BTreeSet::from([Role::User]),
            subscribers: BTreeSet::new(),
            subscriptions: BTreeSet::new(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
            loaded_subscribers: BTreeSet::new(),
        }
    }

    /// Replace the subscriber set with what the store currently holds.
    ///
    /// Stores call this when handing an account out, so that
    /// [`Account::subscriber_changes`] only reports edits made afterwards.
    #[must_use]
    pub fn with_loaded_subscribers(mut self, subscribers: BTreeSet<String>) -> Self {
        self.loaded_subscribers.clone_from(&subscribers);
        self.subscribers = subscribers;
        self
    }

    /// Edges added to or removed from `subscribers` since the account was loaded.
    #[must_use]
    pub fn subscriber_changes(&self) -> SubscriberChanges {
        SubscriberChanges {
            added: self
                .subscribers
                .difference(&self.loaded_subscribers)
                .cloned()
                .collect(),
            removed: self
                .loaded_subscribers
                .difference(&self.subscribers)
                .cloned()
                .collect(),
        }
    }

    /// An account is confirmed once it has no pending email to verify.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        let has_email = self.email.as_deref().is_some_and(|e| !e.trim().is_empty());
        !has_email || self.activation_code.is_none()
    }

    /// Whether the account holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the account is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    fn from_model(
        model: user::Model,
        subscribers: Vec<String>,
        subscriptions: Vec<String>,
    ) -> Self {
        let mut roles: BTreeSet<Role> = model
            .roles
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str().and_then(Role::parse))
            .collect();
        if roles.is_empty() {
            roles.insert(Role::User);
        }

        let account = Self {
            id: model.id,
            username: model.username,
            password: model.password,
            email: model.email,
            active: model.active,
            activation_code: model.activation_code,
            roles,
            subscribers: BTreeSet::new(),
            subscriptions: subscriptions.into_iter().collect(),
            token: model.token,
            created_at: model.created_at,
            updated_at: model.updated_at,
            loaded_subscribers: BTreeSet::new(),
        };

        account.with_loaded_subscribers(subscribers.into_iter().collect())
    }

    fn to_model(&self) -> user::Model {
        let roles: Vec<&str> = self.roles.iter().map(|r| r.as_str()).collect();

        user::Model {
            id: self.id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            active: self.active,
            activation_code: self.activation_code.clone(),
            roles: serde_json::json!(roles),
            token: self.token.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Persistence for [`Account`]s.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact, case-sensitive username lookup.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>>;

    async fn find_by_activation_code(&self, code: &str) -> AppResult<Option<Account>>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>>;

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Account>>;

    async fn find_all(&self) -> AppResult<Vec<Account>>;

    /// Insert or update the account.
    ///
    /// Only the subscriber edges reported by [`Account::subscriber_changes`]
    /// are written, so edges added by other writers since the account was
    /// loaded survive. The returned account carries the stored subscriber set.
    async fn save(&self, account: Account) -> AppResult<Account>;
}

/// Shared account store.
pub type AccountStoreService = Arc<dyn AccountStore>;

/// [`AccountStore`] backed by the relational database.
#[derive(Clone)]
pub struct DbAccountStore {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
}

impl DbAccountStore {
    /// Create a new database-backed store.
    #[must_use]
    pub const fn new(user_repo: UserRepository, subscription_repo: SubscriptionRepository) -> Self {
        Self {
            user_repo,
            subscription_repo,
        }
    }

    async fn load(&self, model: user::Model) -> AppResult<Account> {
        let subscribers = self.subscription_repo.find_subscriber_ids(&model.id).await?;
        let subscriptions = self
            .subscription_repo
            .find_subscription_ids(&model.id)
            .await?;

        Ok(Account::from_model(model, subscribers, subscriptions))
    }

    async fn load_opt(&self, model: Option<user::Model>) -> AppResult<Option<Account>> {
        match model {
            Some(model) => self.load(model).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for DbAccountStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        let model = self.user_repo.find_by_username(username).await?;
        self.load_opt(model).await
    }

    async fn find_by_activation_code(&self, code: &str) -> AppResult<Option<Account>> {
        let model = self.user_repo.find_by_activation_code(code).await?;
        self.load_opt(model).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>> {
        let model = self.user_repo.find_by_id(id).await?;
        self.load_opt(model).await
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Account>> {
        let model = self.user_repo.find_by_token(token).await?;
        self.load_opt(model).await
    }

    async fn find_all(&self) -> AppResult<Vec<Account>> {
        let models = self.user_repo.find_all().await?;

        let mut accounts = Vec::with_capacity(models.len());
        for model in models {
            accounts.push(self.load(model).await?);
        }
        Ok(accounts)
    }

    async fn save(&self, account: Account) -> AppResult<Account> {
        let changes = account.subscriber_changes();
        let saved = self
            .user_repo
            .save_with_subscriber_changes(account.to_model(), &changes.added, &changes.removed)
            .await?;

        self.load(saved).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use sweater_db::entities::user_subscription;

    fn create_test_user(id: &str, username: &str, roles: serde_json::Value) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            password: "hash".to_string(),
            email: Some("a@example.com".to_string()),
            active: true,
            activation_code: Some("code".to_string()),
            roles,
            token: Some("token".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_edge(channel_id: &str, subscriber_id: &str) -> user_subscription::Model {
        user_subscription::Model {
            channel_id: channel_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_store(db: sea_orm::DatabaseConnection) -> DbAccountStore {
        let db = Arc::new(db);
        DbAccountStore::new(
            UserRepository::new(Arc::clone(&db)),
            SubscriptionRepository::new(db),
        )
    }

    #[test]
    fn test_model_conversion_keeps_known_roles() {
        let model = create_test_user("u1", "alice", json!(["ADMIN", "USER", "GHOST"]));
        let account = Account::from_model(model.clone(), vec![], vec![]);

        assert_eq!(account.roles, BTreeSet::from([Role::User, Role::Admin]));
        assert!(account.is_admin());
        assert_eq!(account.to_model().roles, json!(["USER", "ADMIN"]));
    }

    #[test]
    fn test_model_conversion_defaults_to_user_role() {
        let model = create_test_user("u1", "alice", json!([]));
        let account = Account::from_model(model, vec![], vec![]);

        assert_eq!(account.roles, BTreeSet::from([Role::User]));
    }

    #[test]
    fn test_is_confirmed() {
        let model = create_test_user("u1", "alice", json!(["USER"]));
        let mut account = Account::from_model(model, vec![], vec![]);
        assert!(!account.is_confirmed());

        account.activation_code = None;
        assert!(account.is_confirmed());

        account.email = Some("  ".to_string());
        account.activation_code = Some("code".to_string());
        assert!(account.is_confirmed());
    }

    #[test]
    fn test_subscriber_changes_are_relative_to_loaded_set() {
        let model = create_test_user("u1", "alice", json!(["USER"]));
        let mut account = Account::from_model(
            model,
            vec!["u2".to_string(), "u3".to_string()],
            vec![],
        );
        assert!(account.subscriber_changes().is_empty());

        account.subscribers.remove("u2");
        account.subscribers.insert("u4".to_string());

        let changes = account.subscriber_changes();
        assert_eq!(changes.added, vec!["u4".to_string()]);
        assert_eq!(changes.removed, vec!["u2".to_string()]);

        let reloaded = account.with_loaded_subscribers(BTreeSet::from(["u9".to_string()]));
        assert!(reloaded.subscriber_changes().is_empty());
        assert!(reloaded.subscribers.contains("u9"));
    }

    #[test]
    fn test_new_account_defaults() {
        let account = Account::new("u1".to_string(), "alice".to_string(), "hash".to_string());

        assert!(account.active);
        assert_eq!(account.roles, BTreeSet::from([Role::User]));
        assert!(account.subscribers.is_empty());
        assert!(account.is_confirmed());
    }

    #[tokio::test]
    async fn test_find_by_username_loads_subscription_sets() {
        let user = create_test_user("u1", "alice", json!(["USER"]));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[create_test_edge("u1", "u2")]])
            .append_query_results([[create_test_edge("u3", "u1")]])
            .into_connection();

        let store = create_store(db);
        let account = store.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(account.id, "u1");
        assert_eq!(account.subscribers.len(), 1);
        assert_eq!(account.subscriptions.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_username_miss() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let store = create_store(db);
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }
}

//! In-memory collaborators for service and router tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sweater_common::config::{DatabaseConfig, ServerConfig, SubscriptionConfig, UploadConfig};
use sweater_common::{AppError, AppResult, Config};

use super::credential::CredentialHasher;
use super::notification::NotificationGateway;
use super::store::{Account, AccountStore};

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "https://sweater.example".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        mail: None,
        upload: UploadConfig::default(),
        subscriptions: SubscriptionConfig { allow_self: true },
    }
}

pub fn create_test_account(id: &str, username: &str) -> Account {
    let mut account = Account::new(
        id.to_string(),
        username.to_string(),
        "hashed:password".to_string(),
    );
    account.token = Some(format!("token-{id}"));
    account
}

/// Account store keeping everything in a map, counting writes.
///
/// Saves apply [`Account::subscriber_changes`] to the stored set, the same
/// way the database store does.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<BTreeMap<String, Account>>,
    saves: AtomicUsize,
}

impl MemoryAccountStore {
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.accounts.lock().unwrap();
            for account in accounts {
                let subscribers = account.subscribers.clone();
                map.insert(account.id.clone(), account.with_loaded_subscribers(subscribers));
            }
        }
        Arc::new(store)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Account> {
        let map = self.accounts.lock().unwrap();
        map.get(id).map(|a| Self::hydrate(&map, a))
    }

    fn hydrate(map: &BTreeMap<String, Account>, account: &Account) -> Account {
        let mut account = account
            .clone()
            .with_loaded_subscribers(account.subscribers.clone());
        account.subscriptions = map
            .values()
            .filter(|other| other.subscribers.contains(&account.id))
            .map(|other| other.id.clone())
            .collect();
        account
    }

    fn find(&self, pred: impl Fn(&Account) -> bool) -> Option<Account> {
        let map = self.accounts.lock().unwrap();
        map.values().find(|a| pred(a)).map(|a| Self::hydrate(&map, a))
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.username == username))
    }

    async fn find_by_activation_code(&self, code: &str) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.activation_code.as_deref() == Some(code)))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>> {
        Ok(self.get(id))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<Account>> {
        Ok(self.find(|a| a.token.as_deref() == Some(token)))
    }

    async fn find_all(&self) -> AppResult<Vec<Account>> {
        let map = self.accounts.lock().unwrap();
        Ok(map.values().map(|a| Self::hydrate(&map, a)).collect())
    }

    async fn save(&self, account: Account) -> AppResult<Account> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let changes = account.subscriber_changes();

        let mut map = self.accounts.lock().unwrap();
        let mut subscribers: BTreeSet<String> = map
            .get(&account.id)
            .map(|stored| stored.subscribers.clone())
            .unwrap_or_default();
        for id in &changes.removed {
            subscribers.remove(id);
        }
        subscribers.extend(changes.added);

        let stored = account.with_loaded_subscribers(subscribers);
        map.insert(stored.id.clone(), stored.clone());
        Ok(Self::hydrate(&map, &stored))
    }
}

/// Gateway that records every message and optionally fails.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(String, String, String)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, address: &str, subject: &str, body: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push((
            address.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        if self.fail {
            return Err(AppError::Notification("relay unavailable".to_string()));
        }
        Ok(())
    }
}

/// Reversible hasher so tests can assert on stored credentials.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> AppResult<String> {
        Ok(format!("hashed:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, credential: &str) -> AppResult<bool> {
        Ok(credential == format!("hashed:{plaintext}"))
    }
}

//! Account lifecycle service.
//!
//! Registration, email activation, profile updates, lookups and the
//! administrator edit of an account.

use std::collections::BTreeSet;

use serde::Deserialize;
use sweater_common::{AppError, AppResult, Config, IdGenerator};
use sweater_db::entities::user::Role;
use validator::Validate;

use super::credential::CredentialHasherService;
use super::notification::{NotificationGatewayService, NotificationOutcome};
use super::store::{Account, AccountStoreService};

const ACTIVATION_SUBJECT: &str = "Activation code";

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    #[validate(email)]
    pub email: Option<String>,
}

/// Input for updating the caller's own profile.
///
/// An absent or blank `email` removes the address; an absent or empty
/// `password` keeps the current credential.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 128))]
    pub password: Option<String>,

    #[validate(email)]
    pub email: Option<String>,
}

/// Input for an administrator editing an account.
#[derive(Debug, Deserialize, Validate)]
pub struct EditUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    /// Role names; unrecognized names are ignored.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// An account together with the fate of its activation notification.
#[derive(Debug, Clone)]
pub struct AccountChange {
    pub account: Account,
    pub notification: NotificationOutcome,
}

/// Account lifecycle service.
#[derive(Clone)]
pub struct AccountService {
    store: AccountStoreService,
    hasher: CredentialHasherService,
    notifier: NotificationGatewayService,
    id_gen: IdGenerator,
    server_url: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        store: AccountStoreService,
        hasher: CredentialHasherService,
        notifier: NotificationGatewayService,
        config: &Config,
    ) -> Self {
        Self {
            store,
            hasher,
            notifier,
            id_gen: IdGenerator::new(),
            server_url: config.server.url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a new account.
    ///
    /// When an email is supplied the account starts with a pending activation
    /// code and one activation message is sent after the account is stored.
    pub async fn register(&self, mut input: RegisterInput) -> AppResult<AccountChange> {
        input.email = normalize_email(input.email.as_deref());
        input.validate()?;

        if self.store.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::DuplicateUsername(input.username));
        }

        let activation_code = input
            .email
            .as_ref()
            .map(|_| self.id_gen.generate_activation_code());

        let mut account = Account::new(
            self.id_gen.generate(),
            input.username,
            self.hasher.hash(&input.password)?,
        );
        account.email = input.email;
        account.activation_code = activation_code;
        account.token = Some(self.id_gen.generate_token());

        let account = self.store.save(account).await?;
        tracing::info!(user_id = %account.id, username = %account.username, "Registered account");

        let notification = self.send_activation(&account).await;
        Ok(AccountChange {
            account,
            notification,
        })
    }

    /// Confirm an email address with its activation code.
    ///
    /// The code is cleared, so a second call with the same code fails.
    pub async fn activate(&self, code: &str) -> AppResult<Account> {
        let mut account = self
            .store
            .find_by_activation_code(code)
            .await?
            .ok_or(AppError::ActivationCodeNotFound)?;

        account.activation_code = None;
        let account = self.store.save(account).await?;

        tracing::info!(user_id = %account.id, "Activated account");
        Ok(account)
    }

    /// Change the password and/or email of an account.
    pub async fn update_profile(
        &self,
        mut account: Account,
        mut input: UpdateProfileInput,
    ) -> AppResult<AccountChange> {
        input.email = normalize_email(input.email.as_deref());
        input.validate()?;

        let email_changed = normalize_email(account.email.as_deref()) != input.email;

        if email_changed {
            account.activation_code = input
                .email
                .as_ref()
                .map(|_| self.id_gen.generate_activation_code());
            account.email = input.email;
        }

        if let Some(password) = input.password.filter(|p| !p.is_empty()) {
            account.password = self.hasher.hash(&password)?;
        }

        let account = self.store.save(account).await?;

        let notification = if email_changed {
            self.send_activation(&account).await
        } else {
            NotificationOutcome::Skipped
        };

        Ok(AccountChange {
            account,
            notification,
        })
    }

    /// Resolve an account by username for authentication.
    pub async fn authenticate_lookup(&self, username: &str) -> AppResult<Account> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Check a username and password pair.
    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<Account> {
        let account = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !account.active || !self.hasher.verify(password, &account.password)? {
            return Err(AppError::Unauthorized);
        }

        Ok(account)
    }

    /// Resolve an API token. Inactive accounts are rejected like in [`Self::sign_in`].
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Account> {
        self.store
            .find_by_token(token)
            .await?
            .filter(|account| account.active)
            .ok_or(AppError::Unauthorized)
    }

    /// List all accounts.
    pub async fn find_all(&self) -> AppResult<Vec<Account>> {
        self.store.find_all().await
    }

    /// Get an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Account> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Replace the username and roles of an account.
    pub async fn edit_user(&self, mut account: Account, input: EditUserInput) -> AppResult<Account> {
        input.validate()?;

        if input.username != account.username {
            let holder = self.store.find_by_username(&input.username).await?;
            if holder.is_some_and(|h| h.id != account.id) {
                return Err(AppError::DuplicateUsername(input.username));
            }
        }

        let mut roles: BTreeSet<Role> = input.roles.iter().filter_map(|r| Role::parse(r)).collect();
        if roles.is_empty() {
            roles.insert(Role::User);
        }

        account.username = input.username;
        account.roles = roles;

        let account = self.store.save(account).await?;
        tracing::info!(user_id = %account.id, "Edited account");
        Ok(account)
    }

    async fn send_activation(&self, account: &Account) -> NotificationOutcome {
        let (Some(email), Some(code)) = (&account.email, &account.activation_code) else {
            return NotificationOutcome::Skipped;
        };

        let body = format!(
            "Hello, {}!\nWelcome to Sweater. Please, visit next link: {}/activate/{}",
            account.username, self.server_url, code
        );

        match self.notifier.send(email, ACTIVATION_SUBJECT, &body).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %account.id, "Failed to send activation email");
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}

/// `None`, empty and whitespace-only addresses all mean "no email".
fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string)
}

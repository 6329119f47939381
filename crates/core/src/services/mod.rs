//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod credential;
pub mod email;
pub mod message;
pub mod notification;
pub mod store;
pub mod subscription;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use account::{AccountChange, AccountService, EditUserInput, RegisterInput, UpdateProfileInput};
pub use credential::{Argon2Hasher, CredentialHasher, CredentialHasherService};
pub use email::SmtpNotificationGateway;
pub use message::{Attachment, CreateMessageInput, MessageService, UpdateMessageInput};
pub use notification::{
    NoOpNotificationGateway, NotificationGateway, NotificationGatewayService, NotificationOutcome,
};
pub use store::{Account, AccountStore, AccountStoreService, DbAccountStore, SubscriberChanges};
pub use subscription::{ChannelStats, SubscriptionService};

//! Database entities.

#![allow(missing_docs)]

pub mod message;
pub mod user;
pub mod user_subscription;

pub use message::Entity as Message;
pub use user::Entity as User;
pub use user_subscription::Entity as UserSubscription;

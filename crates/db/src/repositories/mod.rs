//! Database repositories.

mod message;
mod subscription;
mod user;

pub use message::MessageRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;

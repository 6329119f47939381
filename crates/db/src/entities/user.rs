//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Authorization role attached to an account.
///
/// Stored as its upper-case name inside the `roles` JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular account.
    User,
    /// Administrator, may edit other accounts.
    Admin,
}

impl Role {
    /// All known roles.
    pub const ALL: [Self; 2] = [Self::User, Self::Admin];

    /// The stored name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse a stored role name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Case-sensitive, unique
    #[sea_orm(unique)]
    pub username: String,

    /// Credential hash (never plaintext)
    pub password: String,

    #[sea_orm(nullable)]
    pub email: Option<String>,

    #[sea_orm(default_value = true)]
    pub active: bool,

    /// Present only while an email confirmation is pending
    #[sea_orm(unique, nullable)]
    pub activation_code: Option<String>,

    /// Role names (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,

    /// API access token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

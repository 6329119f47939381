//! User subscription entity (one row per subscriber of a channel).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_subscription")]
pub struct Model {
    /// The account being followed
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: String,

    /// The account following it
    #[sea_orm(primary_key, auto_increment = false)]
    pub subscriber_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChannelId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SubscriberId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Subscriber,
}

impl ActiveModelBehavior for ActiveModel {}

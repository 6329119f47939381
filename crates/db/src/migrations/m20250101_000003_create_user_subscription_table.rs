//! Create user subscription table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSubscription::ChannelId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscription::SubscriberId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSubscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Composite key: one edge per (channel, subscriber) pair
                    .primary_key(
                        Index::create()
                            .col(UserSubscription::ChannelId)
                            .col(UserSubscription::SubscriberId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_subscription_channel")
                            .from(UserSubscription::Table, UserSubscription::ChannelId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_subscription_subscriber")
                            .from(UserSubscription::Table, UserSubscription::SubscriberId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: subscriber_id (for listing an account's subscriptions)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_subscription_subscriber_id")
                    .table(UserSubscription::Table)
                    .col(UserSubscription::SubscriberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSubscription::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserSubscription {
    Table,
    ChannelId,
    SubscriberId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

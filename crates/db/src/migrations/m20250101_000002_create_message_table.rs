//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Text).text().not_null())
                    .col(ColumnDef::new(Message::Tag).string_len(255))
                    .col(ColumnDef::new(Message::Filename).string_len(512))
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Message::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_author")
                            .from(Message::Table, Message::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (per-user feed)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_author_id")
                    .table(Message::Table)
                    .col(Message::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: tag (tag filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_tag")
                    .table(Message::Table)
                    .col(Message::Tag)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    AuthorId,
    Text,
    Tag,
    Filename,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

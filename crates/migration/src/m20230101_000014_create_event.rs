//! Create `event` table.
//! Append-only log of create/update/remove actions per source.
use sea_orm_migration::{prelude::*, schema::*};

use crate::id_column;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(id_column(Event::Id))
                    .col(string_len(Event::Event, 16))
                    .col(string_len(Event::Source, 32))
                    .col(string_len(Event::CreatedBy, 255))
                    .col(timestamp_with_time_zone(Event::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Event::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Event {
    Table,
    Id,
    Event,
    Source,
    CreatedBy,
    CreatedAt,
}

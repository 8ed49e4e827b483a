//! Create `tag` table.
use sea_orm_migration::{prelude::*, schema::*};

use crate::{id_column, with_audit_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                with_audit_columns(
                    Table::create()
                        .table(Tag::Table)
                        .if_not_exists()
                        .col(id_column(Tag::Id))
                        .col(string_len(Tag::Name, 255)),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tag::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tag {
    Table,
    Id,
    Name,
}

//! Create `type` table.
//! Code lists (vocal ranges, membership kinds, ...) keyed by a short string id.
use sea_orm_migration::{prelude::*, schema::*};

use crate::with_audit_columns;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                with_audit_columns(
                    Table::create()
                        .table(Type::Table)
                        .if_not_exists()
                        .col(string_len(Type::Id, 255).primary_key())
                        .col(string_len(Type::Type, 32))
                        .col(json_null(Type::Labels)),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Type::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Type {
    Table,
    Id,
    Type,
    Labels,
}

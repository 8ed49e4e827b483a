//! Create `spex_category` table.
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
                        .table(SpexCategory::Table)
                        .if_not_exists()
                        .col(id_column(SpexCategory::Id))
                        .col(string_len(SpexCategory::Name, 255))
                        .col(string_len(SpexCategory::FirstYear, 4))
                        .col(blob_null(SpexCategory::Logo))
                        .col(string_len_null(SpexCategory::LogoContentType, 255)),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SpexCategory::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SpexCategory {
    Table,
    Id,
    Name,
    FirstYear,
    Logo,
    LogoContentType,
}

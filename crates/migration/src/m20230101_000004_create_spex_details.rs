//! Create `spex_details` table.
//! Title, poster and category shared by an original spex and its revivals.
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
                        .table(SpexDetails::Table)
                        .if_not_exists()
                        .col(id_column(SpexDetails::Id))
                        .col(string_len(SpexDetails::Title, 255))
                        .col(blob_null(SpexDetails::Poster))
                        .col(string_len_null(SpexDetails::PosterContentType, 255))
                        .col(big_integer_null(SpexDetails::CategoryId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spex_details_category")
                                .from(SpexDetails::Table, SpexDetails::CategoryId)
                                .to(SpexCategory::Table, SpexCategory::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SpexDetails::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SpexDetails {
    Table,
    Id,
    Title,
    Poster,
    PosterContentType,
    CategoryId,
}

#[derive(DeriveIden)]
enum SpexCategory { Table, Id }

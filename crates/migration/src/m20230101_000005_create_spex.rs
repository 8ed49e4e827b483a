//! Create `spex` table.
//! A row with `parent_id` set is a revival of the parent production.
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
                        .table(Spex::Table)
                        .if_not_exists()
                        .col(id_column(Spex::Id))
                        .col(string_len(Spex::Year, 4))
                        .col(big_integer_null(Spex::ParentId))
                        .col(big_integer(Spex::DetailsId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spex_parent")
                                .from(Spex::Table, Spex::ParentId)
                                .to(Spex::Table, Spex::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spex_details")
                                .from(Spex::Table, Spex::DetailsId)
                                .to(SpexDetails::Table, SpexDetails::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Spex::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Spex {
    Table,
    Id,
    Year,
    ParentId,
    DetailsId,
}

#[derive(DeriveIden)]
enum SpexDetails { Table, Id }

//! Create `toggle` table.
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
                        .table(Toggle::Table)
                        .if_not_exists()
                        .col(id_column(Toggle::Id))
                        .col(boolean(Toggle::Value))
                        .col(string_len(Toggle::TypeId, 255))
                        .col(big_integer(Toggle::SpexareId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_toggle_type")
                                .from(Toggle::Table, Toggle::TypeId)
                                .to(Type::Table, Type::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_toggle_spexare")
                                .from(Toggle::Table, Toggle::SpexareId)
                                .to(Spexare::Table, Spexare::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Toggle::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Toggle {
    Table,
    Id,
    Value,
    TypeId,
    SpexareId,
}

#[derive(DeriveIden)]
enum Type { Table, Id }

#[derive(DeriveIden)]
enum Spexare { Table, Id }

//! Create `consent` table.
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
                        .table(Consent::Table)
                        .if_not_exists()
                        .col(id_column(Consent::Id))
                        .col(boolean(Consent::Value))
                        .col(string_len(Consent::TypeId, 255))
                        .col(big_integer(Consent::SpexareId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_consent_type")
                                .from(Consent::Table, Consent::TypeId)
                                .to(Type::Table, Type::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_consent_spexare")
                                .from(Consent::Table, Consent::SpexareId)
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
        manager.drop_table(Table::drop().table(Consent::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Consent {
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

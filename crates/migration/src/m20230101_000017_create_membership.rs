//! Create `membership` table.
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
                        .table(Membership::Table)
                        .if_not_exists()
                        .col(id_column(Membership::Id))
                        .col(string_len(Membership::Year, 4))
                        .col(string_len(Membership::TypeId, 255))
                        .col(big_integer(Membership::SpexareId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_membership_type")
                                .from(Membership::Table, Membership::TypeId)
                                .to(Type::Table, Type::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_membership_spexare")
                                .from(Membership::Table, Membership::SpexareId)
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
        manager.drop_table(Table::drop().table(Membership::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Membership {
    Table,
    Id,
    Year,
    TypeId,
    SpexareId,
}

#[derive(DeriveIden)]
enum Type { Table, Id }

#[derive(DeriveIden)]
enum Spexare { Table, Id }

//! Create `activity` table.
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
                        .table(Activity::Table)
                        .if_not_exists()
                        .col(id_column(Activity::Id))
                        .col(big_integer(Activity::SpexareId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_activity_spexare")
                                .from(Activity::Table, Activity::SpexareId)
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
        manager.drop_table(Table::drop().table(Activity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Activity {
    Table,
    Id,
    SpexareId,
}

#[derive(DeriveIden)]
enum Spexare { Table, Id }

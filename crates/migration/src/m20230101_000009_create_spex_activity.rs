//! Create `spex_activity` table linking an activity to a spex.
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
                        .table(SpexActivity::Table)
                        .if_not_exists()
                        .col(id_column(SpexActivity::Id))
                        .col(big_integer(SpexActivity::ActivityId))
                        .col(big_integer(SpexActivity::SpexId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spex_activity_activity")
                                .from(SpexActivity::Table, SpexActivity::ActivityId)
                                .to(Activity::Table, Activity::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spex_activity_spex")
                                .from(SpexActivity::Table, SpexActivity::SpexId)
                                .to(Spex::Table, Spex::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SpexActivity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SpexActivity {
    Table,
    Id,
    ActivityId,
    SpexId,
}

#[derive(DeriveIden)]
enum Activity { Table, Id }

#[derive(DeriveIden)]
enum Spex { Table, Id }

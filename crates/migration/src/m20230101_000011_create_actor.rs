//! Create `actor` table.
//! Vocal role assignments within a task activity; `vocal_id` refers to a VOCAL type.
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
                        .table(Actor::Table)
                        .if_not_exists()
                        .col(id_column(Actor::Id))
                        .col(string_len_null(Actor::Role, 255))
                        .col(string_len(Actor::VocalId, 255))
                        .col(big_integer(Actor::TaskActivityId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_actor_vocal")
                                .from(Actor::Table, Actor::VocalId)
                                .to(Type::Table, Type::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_actor_task_activity")
                                .from(Actor::Table, Actor::TaskActivityId)
                                .to(TaskActivity::Table, TaskActivity::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    Role,
    VocalId,
    TaskActivityId,
}

#[derive(DeriveIden)]
enum Type { Table, Id }

#[derive(DeriveIden)]
enum TaskActivity { Table, Id }

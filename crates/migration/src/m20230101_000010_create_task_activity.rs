//! Create `task_activity` table linking an activity to a task.
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
                        .table(TaskActivity::Table)
                        .if_not_exists()
                        .col(id_column(TaskActivity::Id))
                        .col(big_integer(TaskActivity::ActivityId))
                        .col(big_integer(TaskActivity::TaskId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_task_activity_activity")
                                .from(TaskActivity::Table, TaskActivity::ActivityId)
                                .to(Activity::Table, Activity::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_task_activity_task")
                                .from(TaskActivity::Table, TaskActivity::TaskId)
                                .to(Task::Table, Task::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TaskActivity::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TaskActivity {
    Table,
    Id,
    ActivityId,
    TaskId,
}

#[derive(DeriveIden)]
enum Activity { Table, Id }

#[derive(DeriveIden)]
enum Task { Table, Id }

//! Create `task` table.
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
                        .table(Task::Table)
                        .if_not_exists()
                        .col(id_column(Task::Id))
                        .col(string_len(Task::Name, 255))
                        .col(big_integer_null(Task::CategoryId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_task_category")
                                .from(Task::Table, Task::CategoryId)
                                .to(TaskCategory::Table, TaskCategory::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Task::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    Name,
    CategoryId,
}

#[derive(DeriveIden)]
enum TaskCategory { Table, Id }

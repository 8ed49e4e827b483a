//! Create `acl_entry` table.
//! One row per (object, role, permission) grant.
use sea_orm_migration::{prelude::*, schema::*};

use crate::id_column;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AclEntry::Table)
                    .if_not_exists()
                    .col(id_column(AclEntry::Id))
                    .col(string_len(AclEntry::ObjectClass, 64))
                    .col(big_integer(AclEntry::ObjectId))
                    .col(string_len(AclEntry::Sid, 64))
                    .col(string_len(AclEntry::Permission, 32))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AclEntry::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AclEntry {
    Table,
    Id,
    ObjectClass,
    ObjectId,
    Sid,
    Permission,
}

//! Create `tagging` join table between spexare and tag.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tagging::Table)
                    .if_not_exists()
                    .col(big_integer(Tagging::SpexareId))
                    .col(big_integer(Tagging::TagId))
                    .primary_key(Index::create().col(Tagging::SpexareId).col(Tagging::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tagging_spexare")
                            .from(Tagging::Table, Tagging::SpexareId)
                            .to(Spexare::Table, Spexare::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tagging_tag")
                            .from(Tagging::Table, Tagging::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tagging::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tagging {
    Table,
    SpexareId,
    TagId,
}

#[derive(DeriveIden)]
enum Spexare { Table, Id }

#[derive(DeriveIden)]
enum Tag { Table, Id }

//! Create `spexare` table.
//! Members of the registry; `partner_id` points back into the same table.
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
                        .table(Spexare::Table)
                        .if_not_exists()
                        .col(id_column(Spexare::Id))
                        .col(string_len(Spexare::FirstName, 255))
                        .col(string_len(Spexare::LastName, 255))
                        .col(string_len_null(Spexare::NickName, 255))
                        .col(string_len_null(Spexare::SocialSecurityNumber, 32))
                        .col(string_len_null(Spexare::Graduation, 255))
                        .col(text_null(Spexare::Comment))
                        .col(blob_null(Spexare::Image))
                        .col(string_len_null(Spexare::ImageContentType, 255))
                        .col(big_integer_null(Spexare::PartnerId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_spexare_partner")
                                .from(Spexare::Table, Spexare::PartnerId)
                                .to(Spexare::Table, Spexare::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        ),
                )
                .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Spexare::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Spexare {
    Table,
    Id,
    FirstName,
    LastName,
    NickName,
    SocialSecurityNumber,
    Graduation,
    Comment,
    Image,
    ImageContentType,
    PartnerId,
}

//! Create `address` table.
//! Contact details of a spexare, one row per ADDRESS type.
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
                        .table(Address::Table)
                        .if_not_exists()
                        .col(id_column(Address::Id))
                        .col(string_len_null(Address::StreetAddress, 255))
                        .col(string_len_null(Address::PostalCode, 255))
                        .col(string_len_null(Address::City, 255))
                        .col(string_len_null(Address::Country, 255))
                        .col(string_len_null(Address::Phone, 255))
                        .col(string_len_null(Address::PhoneMobile, 255))
                        .col(string_len_null(Address::EmailAddress, 255))
                        .col(string_len(Address::TypeId, 255))
                        .col(big_integer(Address::SpexareId))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_address_type")
                                .from(Address::Table, Address::TypeId)
                                .to(Type::Table, Type::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_address_spexare")
                                .from(Address::Table, Address::SpexareId)
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
        manager.drop_table(Table::drop().table(Address::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Address {
    Table,
    Id,
    StreetAddress,
    PostalCode,
    City,
    Country,
    Phone,
    PhoneMobile,
    EmailAddress,
    TypeId,
    SpexareId,
}

#[derive(DeriveIden)]
enum Type { Table, Id }

#[derive(DeriveIden)]
enum Spexare { Table, Id }

//! Migrator registering table migrations in dependency order.
//! Indexes and seed rows are applied last.
pub use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

mod m20230101_000001_create_type;
mod m20230101_000002_create_spexare;
mod m20230101_000003_create_spex_category;
mod m20230101_000004_create_spex_details;
mod m20230101_000005_create_spex;
mod m20230101_000006_create_task_category;
mod m20230101_000007_create_task;
mod m20230101_000008_create_activity;
mod m20230101_000009_create_spex_activity;
mod m20230101_000010_create_task_activity;
mod m20230101_000011_create_actor;
mod m20230101_000012_create_tag;
mod m20230101_000013_create_tagging;
mod m20230101_000014_create_event;
mod m20230101_000015_create_acl_entry;
mod m20230101_000016_create_address;
mod m20230101_000017_create_membership;
mod m20230101_000018_create_consent;
mod m20230101_000019_create_toggle;
mod m20230101_000090_add_indexes;
mod m20230101_000091_seed_vocal_types;
mod m20230101_000092_seed_spexare_types;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230101_000001_create_type::Migration),
            Box::new(m20230101_000002_create_spexare::Migration),
            Box::new(m20230101_000003_create_spex_category::Migration),
            Box::new(m20230101_000004_create_spex_details::Migration),
            Box::new(m20230101_000005_create_spex::Migration),
            Box::new(m20230101_000006_create_task_category::Migration),
            Box::new(m20230101_000007_create_task::Migration),
            Box::new(m20230101_000008_create_activity::Migration),
            Box::new(m20230101_000009_create_spex_activity::Migration),
            Box::new(m20230101_000010_create_task_activity::Migration),
            Box::new(m20230101_000011_create_actor::Migration),
            Box::new(m20230101_000012_create_tag::Migration),
            Box::new(m20230101_000013_create_tagging::Migration),
            Box::new(m20230101_000014_create_event::Migration),
            Box::new(m20230101_000015_create_acl_entry::Migration),
            Box::new(m20230101_000016_create_address::Migration),
            Box::new(m20230101_000017_create_membership::Migration),
            Box::new(m20230101_000018_create_consent::Migration),
            Box::new(m20230101_000019_create_toggle::Migration),
            // Indexes should always be applied last
            Box::new(m20230101_000090_add_indexes::Migration),
            Box::new(m20230101_000091_seed_vocal_types::Migration),
            Box::new(m20230101_000092_seed_spexare_types::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Audit {
    CreatedBy,
    CreatedAt,
    LastModifiedBy,
    LastModifiedAt,
}

/// Append the four audit columns every audited table carries.
pub(crate) fn with_audit_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(string_len(Audit::CreatedBy, 255))
        .col(timestamp_with_time_zone(Audit::CreatedAt))
        .col(string_len_null(Audit::LastModifiedBy, 255))
        .col(timestamp_with_time_zone_null(Audit::LastModifiedAt))
}

/// Auto-incrementing 64-bit primary key.
pub(crate) fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    big_integer(col).auto_increment().primary_key().take()
}

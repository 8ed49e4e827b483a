use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: &[(&str, &str, &[&str], bool)] = &[
    ("idx_spexare_partner", "spexare", &["partner_id"], false),
    ("idx_spex_parent", "spex", &["parent_id"], false),
    ("idx_spex_details", "spex", &["details_id"], false),
    ("idx_activity_spexare", "activity", &["spexare_id"], false),
    ("uniq_spex_activity_activity_spex", "spex_activity", &["activity_id", "spex_id"], true),
    ("uniq_task_activity_activity_task", "task_activity", &["activity_id", "task_id"], true),
    ("uniq_actor_task_activity_vocal", "actor", &["task_activity_id", "vocal_id"], true),
    ("uniq_address_spexare_type", "address", &["spexare_id", "type_id"], true),
    ("uniq_membership_spexare_type_year", "membership", &["spexare_id", "type_id", "year"], true),
    ("uniq_consent_spexare_type", "consent", &["spexare_id", "type_id"], true),
    ("uniq_toggle_spexare_type", "toggle", &["spexare_id", "type_id"], true),
    ("idx_event_created_at", "event", &["created_at"], false),
    ("idx_event_source", "event", &["source"], false),
    ("uniq_acl_entry", "acl_entry", &["object_class", "object_id", "sid", "permission"], true),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, cols, unique) in INDEXES {
            let mut index = Index::create();
            index.name(*name).table(Alias::new(*table));
            for col in cols.iter() {
                index.col(Alias::new(*col));
            }
            if *unique {
                index.unique();
            }
            manager.create_index(index.to_owned()).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _, _) in INDEXES.iter().rev() {
            manager
                .drop_index(Index::drop().name(*name).table(Alias::new(*table)).to_owned())
                .await?;
        }
        Ok(())
    }
}

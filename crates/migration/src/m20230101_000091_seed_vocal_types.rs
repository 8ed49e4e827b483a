//! Seed the vocal ranges actors are assigned to.
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

const VOCALS: &[(&str, &str, &str)] = &[
    ("S1", "Sopran 1", "Soprano 1"),
    ("S2", "Sopran 2", "Soprano 2"),
    ("A1", "Alt 1", "Alto 1"),
    ("A2", "Alt 2", "Alto 2"),
    ("T1", "Tenor 1", "Tenor 1"),
    ("T2", "Tenor 2", "Tenor 2"),
    ("B1", "Bas 1", "Bass 1"),
    ("B2", "Bas 2", "Bass 2"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for (id, sv, en) in VOCALS {
            let sql = format!(
                r#"INSERT INTO "type" ("id", "type", "labels", "created_by", "created_at") VALUES ('{id}', 'VOCAL', '{{"sv":"{sv}","en":"{en}"}}', 'system', '2023-01-01T00:00:00+00:00')"#
            );
            db.execute_unprepared(&sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"DELETE FROM "type" WHERE "type" = 'VOCAL'"#)
            .await?;
        Ok(())
    }
}

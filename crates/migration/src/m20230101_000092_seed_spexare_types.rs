//! Seed the address, membership, consent and toggle kinds a spexare can carry.
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TYPES: &[(&str, &str, &str, &str)] = &[
    ("HOME", "ADDRESS", "Hem", "Home"),
    ("WORK", "ADDRESS", "Arbete", "Work"),
    ("FGV", "MEMBERSHIP", "FGV", "FGV"),
    ("CING", "MEMBERSHIP", "Cing", "Cing"),
    ("PUBLISH", "CONSENT", "Publicering", "Publishing"),
    ("CIRCULARS", "CONSENT", "Utskick", "Circulars"),
    ("DECEASED", "TOGGLE", "Avliden", "Deceased"),
    ("CHALMERS_STUDENT", "TOGGLE", "Chalmerist", "Chalmers student"),
];

const KINDS: &str = "'ADDRESS', 'MEMBERSHIP', 'CONSENT', 'TOGGLE'";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for (id, kind, sv, en) in TYPES {
            let sql = format!(
                r#"INSERT INTO "type" ("id", "type", "labels", "created_by", "created_at") VALUES ('{id}', '{kind}', '{{"sv":"{sv}","en":"{en}"}}', 'system', '2023-01-01T00:00:00+00:00')"#
            );
            db.execute_unprepared(&sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(r#"DELETE FROM "type" WHERE "type" IN ({KINDS})"#))
            .await?;
        Ok(())
    }
}

use anyhow::Result;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder, Set};

use super::setup_test_db;
use crate::audit::{with_auditor, SYSTEM_AUDITOR};
use crate::event::{self, EventType, SourceType};
use crate::{spex_details, tag};

#[tokio::test]
async fn test_insert_and_update_are_stamped() -> Result<()> {
    let db = setup_test_db().await?;

    let created = with_auditor("creator", async {
        tag::ActiveModel { name: Set("Kör".into()), ..Default::default() }.insert(&db).await
    })
    .await?;
    assert_eq!(created.created_by, "creator");
    assert_eq!(created.last_modified_by.as_deref(), Some("creator"));

    let mut am: tag::ActiveModel = created.clone().into();
    am.name = Set("Orkester".into());
    let updated = with_auditor("editor", async { am.update(&db).await }).await?;
    assert_eq!(updated.created_by, "creator");
    assert_eq!(updated.last_modified_by.as_deref(), Some("editor"));
    Ok(())
}

#[tokio::test]
async fn test_saves_and_deletes_write_events() -> Result<()> {
    let db = setup_test_db().await?;

    let t = with_auditor("admin", async {
        tag::ActiveModel { name: Set("Dans".into()), ..Default::default() }.insert(&db).await
    })
    .await?;
    let mut am: tag::ActiveModel = t.clone().into();
    am.name = Set("Dansare".into());
    let t = am.update(&db).await?;
    t.delete(&db).await?;

    let events = event::Entity::find().order_by_asc(event::Column::Id).all(&db).await?;
    let kinds: Vec<_> = events.iter().map(|e| e.event).collect();
    assert_eq!(kinds, vec![EventType::Create, EventType::Update, EventType::Remove]);
    assert!(events.iter().all(|e| e.source == SourceType::Tag));
    assert_eq!(events[0].created_by, "admin");
    assert_eq!(events[1].created_by, SYSTEM_AUDITOR);
    Ok(())
}

#[tokio::test]
async fn test_unsourced_entities_do_not_write_events() -> Result<()> {
    let db = setup_test_db().await?;
    let details = spex_details::ActiveModel { title: Set("Näktergalen".into()), ..Default::default() }.insert(&db).await?;
    assert_eq!(details.created_by, SYSTEM_AUDITOR);
    assert_eq!(event::Entity::find().count(&db).await?, 0);
    Ok(())
}

#[test]
fn source_type_parses_case_insensitively() {
    assert_eq!("spex_category".parse::<SourceType>(), Ok(SourceType::SpexCategory));
    assert!("bogus".parse::<SourceType>().is_err());
}

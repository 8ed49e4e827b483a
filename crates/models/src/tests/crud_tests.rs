use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set};

use super::setup_test_db;
use crate::{activity, actor, address, membership, spex, spex_activity, spex_details, spexare, tag, tagging, task, task_activity, task_category, types};

async fn new_spexare(db: &sea_orm::DatabaseConnection, first: &str) -> Result<spexare::Model> {
    Ok(spexare::ActiveModel {
        first_name: Set(first.to_string()),
        last_name: Set("Spexare".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

#[tokio::test]
async fn test_spexare_crud() -> Result<()> {
    let db = setup_test_db().await?;

    let created = new_spexare(&db, "Kalle").await?;
    assert_eq!(created.first_name, "Kalle");

    let mut am: spexare::ActiveModel = created.clone().into();
    am.nick_name = Set(Some("Kula".to_string()));
    let updated = am.update(&db).await?;
    assert_eq!(updated.nick_name.as_deref(), Some("Kula"));
    assert_eq!(updated.created_at, created.created_at);

    updated.delete(&db).await?;
    assert!(spexare::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_vocal_types_are_seeded() -> Result<()> {
    let db = setup_test_db().await?;
    let vocals = types::Entity::find()
        .filter(types::Column::Kind.eq(types::TypeType::Vocal))
        .all(&db)
        .await?;
    assert_eq!(vocals.len(), 8);
    let s1 = vocals.iter().find(|t| t.id == "S1").expect("S1 seeded");
    assert!(s1.label("en").is_some());
    Ok(())
}

#[tokio::test]
async fn test_spexare_delete_cascades_activities() -> Result<()> {
    let db = setup_test_db().await?;
    let s = new_spexare(&db, "Olle").await?;

    let details = spex_details::ActiveModel { title: Set("Napoleon".into()), ..Default::default() }.insert(&db).await?;
    let sp = spex::ActiveModel { year: Set("1948".into()), details_id: Set(details.id), ..Default::default() }.insert(&db).await?;
    let tc = task_category::ActiveModel { name: Set("Scen".into()), has_actor: Set(true), ..Default::default() }.insert(&db).await?;
    let t = task::ActiveModel { name: Set("Skådespelare".into()), category_id: Set(Some(tc.id)), ..Default::default() }.insert(&db).await?;

    let a = activity::ActiveModel { spexare_id: Set(s.id), ..Default::default() }.insert(&db).await?;
    spex_activity::ActiveModel { activity_id: Set(a.id), spex_id: Set(sp.id), ..Default::default() }.insert(&db).await?;
    let ta = task_activity::ActiveModel { activity_id: Set(a.id), task_id: Set(t.id), ..Default::default() }.insert(&db).await?;
    actor::ActiveModel { task_activity_id: Set(ta.id), vocal_id: Set("B1".into()), role: Set(Some("Napoleon".into())), ..Default::default() }
        .insert(&db)
        .await?;

    assert_eq!(s.find_related(activity::Entity).count(&db).await?, 1);

    s.delete(&db).await?;
    assert_eq!(activity::Entity::find().count(&db).await?, 0);
    assert_eq!(spex_activity::Entity::find().count(&db).await?, 0);
    assert_eq!(task_activity::Entity::find().count(&db).await?, 0);
    assert_eq!(actor::Entity::find().count(&db).await?, 0);
    // the spex and task themselves stay
    assert_eq!(spex::Entity::find().count(&db).await?, 1);
    assert_eq!(task::Entity::find().count(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_spex_activity_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let s = new_spexare(&db, "Lisa").await?;
    let details = spex_details::ActiveModel { title: Set("Caesar".into()), ..Default::default() }.insert(&db).await?;
    let sp = spex::ActiveModel { year: Set("1950".into()), details_id: Set(details.id), ..Default::default() }.insert(&db).await?;
    let a = activity::ActiveModel { spexare_id: Set(s.id), ..Default::default() }.insert(&db).await?;

    spex_activity::ActiveModel { activity_id: Set(a.id), spex_id: Set(sp.id), ..Default::default() }.insert(&db).await?;
    let dup = spex_activity::ActiveModel { activity_id: Set(a.id), spex_id: Set(sp.id), ..Default::default() }.insert(&db).await;
    assert!(dup.is_err());
    Ok(())
}

#[tokio::test]
async fn test_tagging_links_spexare_and_tag() -> Result<()> {
    let db = setup_test_db().await?;
    let s = new_spexare(&db, "Nisse").await?;
    let t = tag::ActiveModel { name: Set("Styrelse".into()), ..Default::default() }.insert(&db).await?;
    tagging::ActiveModel { spexare_id: Set(s.id), tag_id: Set(t.id) }.insert(&db).await?;

    let tags = s.find_related(tag::Entity).all(&db).await?;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "Styrelse");

    let tagged = t.find_related(spexare::Entity).all(&db).await?;
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, s.id);
    Ok(())
}

#[tokio::test]
async fn test_revival_shares_details_and_cascades() -> Result<()> {
    let db = setup_test_db().await?;
    let details = spex_details::ActiveModel { title: Set("Fritiof".into()), ..Default::default() }.insert(&db).await?;
    let parent = spex::ActiveModel { year: Set("1960".into()), details_id: Set(details.id), ..Default::default() }.insert(&db).await?;
    let revival = spex::ActiveModel {
        year: Set("1990".into()),
        parent_id: Set(Some(parent.id)),
        details_id: Set(details.id),
        ..Default::default()
    }
    .insert(&db)
    .await?;
    assert!(revival.is_revival());
    assert!(!parent.is_revival());

    parent.delete(&db).await?;
    assert!(spex::Entity::find_by_id(revival.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_spexare_delete_cascades_contact_rows() -> Result<()> {
    let db = setup_test_db().await?;
    let s = new_spexare(&db, "Stina").await?;
    address::ActiveModel { city: Set(Some("Göteborg".into())), type_id: Set("HOME".into()), spexare_id: Set(s.id), ..Default::default() }
        .insert(&db)
        .await?;
    membership::ActiveModel { year: Set("2001".into()), type_id: Set("FGV".into()), spexare_id: Set(s.id), ..Default::default() }
        .insert(&db)
        .await?;
    let dup = membership::ActiveModel { year: Set("2001".into()), type_id: Set("FGV".into()), spexare_id: Set(s.id), ..Default::default() }
        .insert(&db)
        .await;
    assert!(dup.is_err());

    s.delete(&db).await?;
    assert_eq!(address::Entity::find().count(&db).await?, 0);
    assert_eq!(membership::Entity::find().count(&db).await?, 0);
    Ok(())
}

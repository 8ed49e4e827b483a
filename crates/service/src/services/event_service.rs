use chrono::{Duration, Utc};
use models::event::{self, EventType, SourceType};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::errors::ServiceError;

pub const DEFAULT_SINCE_IN_DAYS: u32 = 90;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: i64,
    pub event: EventType,
    pub source: SourceType,
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
}

impl From<event::Model> for EventDto {
    fn from(m: event::Model) -> Self {
        Self { id: m.id, event: m.event, source: m.source, created_by: m.created_by, created_at: m.created_at }
    }
}

/// Start of the UTC day `days` days ago.
fn since(days: u32) -> Result<DateTimeWithTimeZone, ServiceError> {
    let day = Duration::try_days(i64::from(days))
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .ok_or_else(|| ServiceError::Validation(format!("sinceInDays: {days} is out of range")))?
        .date_naive();
    Ok(day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().fixed_offset())
}

/// Events newer than `since_in_days`, newest first, optionally for one source.
pub async fn find_since<C: ConnectionTrait>(
    db: &C,
    since_in_days: u32,
    source: Option<SourceType>,
) -> Result<Vec<EventDto>, ServiceError> {
    let mut q = event::Entity::find().filter(event::Column::CreatedAt.gte(since(since_in_days)?));
    if let Some(s) = source {
        q = q.filter(event::Column::Source.eq(s));
    }
    let rows = q
        .order_by_desc(event::Column::CreatedAt)
        .order_by_desc(event::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(EventDto::from).collect())
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<EventDto>, ServiceError> {
    Ok(event::Entity::find_by_id(id).one(db).await?.map(EventDto::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::{audit::with_auditor, tag};
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn events_are_filtered_by_source_and_newest_first() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        with_auditor("admin", async {
            tag::ActiveModel { name: Set("Kör".into()), ..Default::default() }.insert(&db).await
        })
        .await?;
        event::record(&db, EventType::Create, SourceType::Spex).await?;

        let all = find_since(&db, DEFAULT_SINCE_IN_DAYS, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].source, SourceType::Spex);

        let tags = find_since(&db, 0, Some(SourceType::Tag)).await?;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].created_by, "admin");

        let one = find_by_id(&db, tags[0].id).await?.unwrap();
        assert_eq!(one.event, EventType::Create);
        assert!(find_by_id(&db, 9999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn since_in_days_beyond_the_calendar_is_rejected() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let err = find_since(&db, 100_000_000, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(matches!(find_since(&db, u32::MAX, Some(SourceType::Tag)).await, Err(ServiceError::Validation(_))));
        // a long but representable window is fine
        assert!(find_since(&db, 36_500, None).await?.is_empty());
        Ok(())
    }
}

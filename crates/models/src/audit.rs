//! Who is acting, and the audit stamps derived from it.
//!
//! The HTTP layer runs each request inside [`with_auditor`]; entity hooks read
//! [`current_auditor`] when stamping rows and writing events.

use std::future::Future;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

pub const SYSTEM_AUDITOR: &str = "system";

tokio::task_local! {
    static AUDITOR: String;
}

pub fn current_auditor() -> String {
    AUDITOR
        .try_with(|a| a.clone())
        .unwrap_or_else(|_| SYSTEM_AUDITOR.to_string())
}

pub async fn with_auditor<F: Future>(auditor: impl Into<String>, fut: F) -> F::Output {
    AUDITOR.scope(auditor.into(), fut).await
}

#[derive(Debug, Clone)]
pub struct Stamp {
    pub by: String,
    pub at: DateTimeWithTimeZone,
}

impl Stamp {
    pub fn now() -> Self {
        Self { by: current_auditor(), at: Utc::now().into() }
    }
}

/// Implements `ActiveModelBehavior` for an entity with the four audit columns.
/// With a `SourceType` argument, saves and deletes are also written to the event log.
#[macro_export]
macro_rules! audited_behavior {
    () => {
        #[async_trait::async_trait]
        impl sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                let stamp = $crate::audit::Stamp::now();
                if insert {
                    self.created_by = sea_orm::Set(stamp.by.clone());
                    self.created_at = sea_orm::Set(stamp.at);
                }
                self.last_modified_by = sea_orm::Set(Some(stamp.by));
                self.last_modified_at = sea_orm::Set(Some(stamp.at));
                Ok(self)
            }
        }
    };
    ($source:expr) => {
        #[async_trait::async_trait]
        impl sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                let stamp = $crate::audit::Stamp::now();
                if insert {
                    self.created_by = sea_orm::Set(stamp.by.clone());
                    self.created_at = sea_orm::Set(stamp.at);
                }
                self.last_modified_by = sea_orm::Set(Some(stamp.by));
                self.last_modified_at = sea_orm::Set(Some(stamp.at));
                Ok(self)
            }

            async fn after_save<C>(model: Model, db: &C, insert: bool) -> Result<Model, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                $crate::event::record(db, $crate::event::EventType::on_save(insert), $source).await?;
                Ok(model)
            }

            async fn after_delete<C>(self, db: &C) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                $crate::event::record(db, $crate::event::EventType::Remove, $source).await?;
                Ok(self)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auditor_defaults_to_system() {
        assert_eq!(current_auditor(), SYSTEM_AUDITOR);
    }

    #[tokio::test]
    async fn auditor_is_scoped_to_future() {
        let inside = with_auditor("kalle", async { current_auditor() }).await;
        assert_eq!(inside, "kalle");
        assert_eq!(current_auditor(), SYSTEM_AUDITOR);
    }

    #[tokio::test]
    async fn stamp_uses_current_auditor() {
        let stamp = with_auditor("editor", async { Stamp::now() }).await;
        assert_eq!(stamp.by, "editor");
    }
}

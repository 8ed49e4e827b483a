//! Free-text spexare search with facet counts.
//!
//! Every whitespace separated term of `q` must match, case-insensitively, one
//! of the spexare text columns or the role of one of the spexare's actors.
//! Facets count distinct matching spexare per value.

mod repository;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::pagination::Page;
use crate::services::spexare_service::SpexareDto;

pub use repository::{SeaOrmSearchRepository, SearchRepository};

pub const FACET_SPEX_YEAR: &str = "activities.spexActivity.spex.year";
pub const FACET_SPEX_TITLE: &str = "activities.spexActivity.spex.details.title";
pub const FACET_SPEX_CATEGORY: &str = "activities.spexActivity.spex.details.category.name";
pub const FACET_TASK_NAME: &str = "activities.taskActivities.task.name";
pub const FACET_TASK_CATEGORY: &str = "activities.taskActivities.task.category.name";
pub const FACET_VOCAL: &str = "activities.taskActivities.actors.vocal.id";
pub const FACET_TAG: &str = "tags.name";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Facet {
    pub name: String,
    pub values: BTreeMap<String, u64>,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub page: Page<SpexareDto>,
    pub facets: Vec<Facet>,
}

/// Lowercased search terms; blank input yields none.
pub fn terms(q: &str) -> Vec<String> {
    q.split_whitespace().map(|t| t.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageRequest;
    use crate::services::spex_activity_service;
    use crate::services::spex_service::{self, SpexCreateDto};
    use crate::services::spexare_service::{self, SpexareCreateDto};
    use crate::services::task_activity_service;
    use crate::services::task_service::{self, TaskCreateDto};
    use crate::services::{activity_service, actor_service, tag_service, tagging_service};
    use crate::test_support::get_db;

    #[test]
    fn terms_split_and_lowercase() {
        assert_eq!(terms("  Kalle  ANKA "), vec!["kalle".to_string(), "anka".to_string()]);
        assert!(terms("   ").is_empty());
    }

    #[tokio::test]
    async fn search_matches_all_terms_and_counts_facets() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let kalle = spexare_service::create(&db, SpexareCreateDto { first_name: "Kalle".into(), last_name: "Anka".into(), ..Default::default() }).await?;
        spexare_service::create(&db, SpexareCreateDto { first_name: "Kajsa".into(), last_name: "Anka".into(), ..Default::default() }).await?;

        let spex = spex_service::create(&db, SpexCreateDto { year: "1999".into(), title: "Erik XIV".into() }).await?;
        let task = task_service::create(&db, TaskCreateDto { name: "Skådespelare".into() }).await?;
        let activity = activity_service::create(&db, kalle.id).await?;
        spex_activity_service::create(&db, kalle.id, activity.id, spex.id).await?;
        let ta = task_activity_service::create(&db, kalle.id, activity.id, task.id).await?;
        actor_service::create(&db, kalle.id, activity.id, ta.id, "B1", actor_service::ActorCreateDto { role: Some("Kungen".into()) }).await?;
        let tag = tag_service::create(&db, tag_service::TagCreateDto { name: "Kör".into() }).await?;
        tagging_service::create(&db, kalle.id, tag.id).await?;

        let repo = SeaOrmSearchRepository { db: db.clone() };
        let all = repo.search("anka", &PageRequest::default()).await?;
        assert_eq!(all.page.total_elements, 2);

        let by_role = repo.search("KUNG anka", &PageRequest::default()).await?;
        assert_eq!(by_role.page.total_elements, 1);
        assert_eq!(by_role.page.content[0].id, kalle.id);

        let facet = |name: &str| by_role.facets.iter().find(|f| f.name == name).cloned().unwrap();
        assert_eq!(facet(FACET_SPEX_YEAR).values.get("1999"), Some(&1));
        assert_eq!(facet(FACET_SPEX_TITLE).values.get("Erik XIV"), Some(&1));
        assert_eq!(facet(FACET_TASK_NAME).values.get("Skådespelare"), Some(&1));
        assert_eq!(facet(FACET_VOCAL).values.get("B1"), Some(&1));
        assert_eq!(facet(FACET_TAG).values.get("Kör"), Some(&1));
        assert!(facet(FACET_SPEX_CATEGORY).values.is_empty());

        let none = repo.search("nobody", &PageRequest::default()).await?;
        assert_eq!(none.page.total_elements, 0);
        assert!(none.facets.iter().all(|f| f.values.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn like_metacharacters_in_terms_are_literal() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        spexare_service::create(&db, SpexareCreateDto { first_name: "Kalle".into(), last_name: "Anka".into(), ..Default::default() }).await?;
        let nick = SpexareCreateDto { first_name: "Rut".into(), last_name: "Ek".into(), nick_name: Some("100%_Rut".into()), ..Default::default() };
        spexare_service::create(&db, nick).await?;

        let repo = SeaOrmSearchRepository { db: db.clone() };
        assert_eq!(repo.search("K_lle", &PageRequest::default()).await?.page.total_elements, 0);
        let percent = repo.search("%", &PageRequest::default()).await?;
        assert_eq!(percent.page.total_elements, 1);
        assert_eq!(percent.page.content[0].first_name, "Rut");
        assert_eq!(repo.search("0%_r", &PageRequest::default()).await?.page.total_elements, 1);
        Ok(())
    }
}

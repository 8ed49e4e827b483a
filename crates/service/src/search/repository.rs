use std::collections::BTreeMap;

use async_trait::async_trait;
use models::{activity, actor, spex, spex_activity, spex_category, spex_details, spexare, tag, tagging, task, task_activity, task_category};
use sea_orm::sea_query::{Expr, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QuerySelect, QueryTrait,
    RelationTrait, Select,
};
use tracing::{debug, instrument};

use super::{terms, Facet, SearchResult};
use super::{FACET_SPEX_CATEGORY, FACET_SPEX_TITLE, FACET_SPEX_YEAR, FACET_TAG, FACET_TASK_CATEGORY, FACET_TASK_NAME, FACET_VOCAL};
use crate::errors::ServiceError;
use crate::filter::contains_ci;
use crate::pagination::{fetch_page, PageRequest, SortOrder};
use crate::services::spexare_service::{SpexareDto, FIELDS};

#[async_trait]
pub trait SearchRepository: Send + Sync {
    async fn search(&self, q: &str, req: &PageRequest) -> Result<SearchResult, ServiceError>;
}

/// SeaORM-backed search over the relational tables.
pub struct SeaOrmSearchRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl SearchRepository for SeaOrmSearchRepository {
    #[instrument(skip(self, req))]
    async fn search(&self, q: &str, req: &PageRequest) -> Result<SearchResult, ServiceError> {
        let terms = terms(q);
        let page = fetch_page(
            &self.db,
            spexare::Entity::find().filter(spexare::Column::Id.in_subquery(matching_ids(&terms))),
            &req.clone().or_sort(SortOrder::asc("firstName")),
            &FIELDS,
        )
        .await?
        .map(SpexareDto::from);

        let mut facets = Vec::with_capacity(7);
        for name in [FACET_SPEX_YEAR, FACET_SPEX_TITLE, FACET_SPEX_CATEGORY, FACET_TASK_NAME, FACET_TASK_CATEGORY, FACET_VOCAL, FACET_TAG] {
            let values = facet_values(&self.db, name, matching_ids(&terms)).await?;
            facets.push(Facet { name: name.to_string(), values });
        }
        debug!(total = page.total_elements, "search_done");
        Ok(SearchResult { page, facets })
    }
}

/// Ids of spexare where every term hits some text column or actor role.
fn matching_ids(terms: &[String]) -> SelectStatement {
    let mut all = Condition::all();
    for term in terms {
        let by_role = actor::Entity::find()
            .select_only()
            .column(activity::Column::SpexareId)
            .join(JoinType::InnerJoin, actor::Relation::TaskActivity.def())
            .join(JoinType::InnerJoin, task_activity::Relation::Activity.def())
            .filter(contains_ci(actor::Column::Role, term))
            .into_query();
        all = all.add(
            Condition::any()
                .add(contains_ci(spexare::Column::FirstName, term))
                .add(contains_ci(spexare::Column::LastName, term))
                .add(contains_ci(spexare::Column::NickName, term))
                .add(contains_ci(spexare::Column::SocialSecurityNumber, term))
                .add(contains_ci(spexare::Column::Graduation, term))
                .add(contains_ci(spexare::Column::Comment, term))
                .add(spexare::Column::Id.in_subquery(by_role)),
        );
    }
    spexare::Entity::find().select_only().column(spexare::Column::Id).filter(all).into_query()
}

fn counted<E: EntityTrait>(select: Select<E>, value: impl ColumnTrait + Copy, spexare_col: &str) -> Select<E> {
    select
        .select_only()
        .column_as(value, "value")
        .column_as(Expr::cust(format!("COUNT(DISTINCT {spexare_col})")), "hits")
        .group_by(value)
}

async fn facet_values<C: ConnectionTrait>(db: &C, name: &str, ids: SelectStatement) -> Result<BTreeMap<String, u64>, ServiceError> {
    const BY_ACTIVITY: &str = r#""activity"."spexare_id""#;
    let spex_side = || {
        spex_activity::Entity::find()
            .join(JoinType::InnerJoin, spex_activity::Relation::Activity.def())
            .join(JoinType::InnerJoin, spex_activity::Relation::Spex.def())
            .filter(activity::Column::SpexareId.in_subquery(ids.clone()))
    };
    let task_side = || {
        task_activity::Entity::find()
            .join(JoinType::InnerJoin, task_activity::Relation::Activity.def())
            .join(JoinType::InnerJoin, task_activity::Relation::Task.def())
            .filter(activity::Column::SpexareId.in_subquery(ids.clone()))
    };
    let rows: Vec<(String, i64)> = match name {
        super::FACET_SPEX_YEAR => counted(spex_side(), spex::Column::Year, BY_ACTIVITY).into_tuple().all(db).await?,
        super::FACET_SPEX_TITLE => {
            counted(spex_side().join(JoinType::InnerJoin, spex::Relation::Details.def()), spex_details::Column::Title, BY_ACTIVITY)
                .into_tuple()
                .all(db)
                .await?
        }
        super::FACET_SPEX_CATEGORY => counted(
            spex_side()
                .join(JoinType::InnerJoin, spex::Relation::Details.def())
                .join(JoinType::InnerJoin, spex_details::Relation::Category.def()),
            spex_category::Column::Name,
            BY_ACTIVITY,
        )
        .into_tuple()
        .all(db)
        .await?,
        super::FACET_TASK_NAME => counted(task_side(), task::Column::Name, BY_ACTIVITY).into_tuple().all(db).await?,
        super::FACET_TASK_CATEGORY => {
            counted(task_side().join(JoinType::InnerJoin, task::Relation::Category.def()), task_category::Column::Name, BY_ACTIVITY)
                .into_tuple()
                .all(db)
                .await?
        }
        super::FACET_VOCAL => counted(
            actor::Entity::find()
                .join(JoinType::InnerJoin, actor::Relation::TaskActivity.def())
                .join(JoinType::InnerJoin, task_activity::Relation::Activity.def())
                .filter(activity::Column::SpexareId.in_subquery(ids.clone())),
            actor::Column::VocalId,
            BY_ACTIVITY,
        )
        .into_tuple()
        .all(db)
        .await?,
        super::FACET_TAG => counted(
            tagging::Entity::find()
                .join(JoinType::InnerJoin, tagging::Relation::Tag.def())
                .filter(tagging::Column::SpexareId.in_subquery(ids.clone())),
            tag::Column::Name,
            r#""tagging"."spexare_id""#,
        )
        .into_tuple()
        .all(db)
        .await?,
        other => return Err(ServiceError::Internal(format!("unknown facet '{other}'"))),
    };
    Ok(rows.into_iter().map(|(v, n)| (v, n.max(0) as u64)).collect())
}

//! Paging and sorting for collection queries.
//!
//! Pages are 0-based; `size` is clamped to 1..=100 and defaults to 20.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, Order, PaginatorTrait, QueryOrder, Select};
use serde::Serialize;

use crate::errors::ServiceError;
use crate::filter::Fields;

pub const DEFAULT_SIZE: u64 = 20;
pub const MAX_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    /// `field[,asc|desc]`
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let (field, dir) = match raw.split_once(',') {
            Some((f, d)) => (f.trim(), d.trim()),
            None => (raw.trim(), "asc"),
        };
        let direction = match dir.to_ascii_lowercase().as_str() {
            "asc" | "" => Direction::Asc,
            "desc" => Direction::Desc,
            other => return Err(ServiceError::Validation(format!("sort: unknown direction '{other}'"))),
        };
        if field.is_empty() {
            return Err(ServiceError::Validation("sort: missing field".into()));
        }
        Ok(Self { field: field.to_string(), direction })
    }

    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), direction: Direction::Asc }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), direction: Direction::Desc }
    }

    /// Query string form, as accepted by [`SortOrder::parse`].
    pub fn to_param(&self) -> String {
        match self.direction {
            Direction::Asc => format!("{},asc", self.field),
            Direction::Desc => format!("{},desc", self.field),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Vec<SortOrder>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_SIZE, sort: Vec::new() }
    }
}

impl PageRequest {
    pub fn new(page: Option<u64>, size: Option<u64>, sort: &[String]) -> Result<Self, ServiceError> {
        let sort = sort
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SortOrder::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let req = Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_SIZE).clamp(1, MAX_SIZE),
            sort,
        };
        req.offset()?;
        Ok(req)
    }

    /// Row offset of this page. Must fit a signed 64-bit SQL OFFSET.
    pub fn offset(&self) -> Result<u64, ServiceError> {
        self.page
            .checked_mul(self.size)
            .filter(|o| i64::try_from(*o).is_ok())
            .ok_or_else(|| ServiceError::Validation(format!("page: {} is out of range", self.page)))
    }

    pub fn of(page: u64, size: u64) -> Self {
        Self { page, size: size.clamp(1, MAX_SIZE), sort: Vec::new() }
    }

    /// Use `default` when the caller asked for no ordering.
    pub fn or_sort(mut self, default: SortOrder) -> Self {
        if self.sort.is_empty() {
            self.sort.push(default);
        }
        self
    }

    pub fn with_page(&self, page: u64) -> Self {
        Self { page, ..self.clone() }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 0
    }
}

/// Apply the requested ordering, looking sort fields up in `fields`.
pub fn apply_sort<E, C>(mut select: Select<E>, req: &PageRequest, fields: &Fields<C>) -> Result<Select<E>, ServiceError>
where
    E: EntityTrait,
    C: ColumnTrait + Copy,
{
    for s in &req.sort {
        let (col, _) = fields.require(&s.field)?;
        let order = match s.direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        };
        select = select.order_by(col, order);
    }
    Ok(select)
}

/// Sort, count and fetch one page.
pub async fn fetch_page<C, E, F>(db: &C, select: Select<E>, req: &PageRequest, fields: &Fields<F>) -> Result<Page<E::Model>, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync,
    F: ColumnTrait + Copy,
{
    req.offset()?;
    let select = apply_sort(select, req, fields)?;
    let paginator = select.paginate(db, req.size);
    let totals = paginator.num_items_and_pages().await?;
    let content = paginator.fetch_page(req.page).await?;
    Ok(Page {
        content,
        number: req.page,
        size: req.size,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_size_and_defaults() {
        let r = PageRequest::new(None, Some(1000), &[]).unwrap();
        assert_eq!(r.page, 0);
        assert_eq!(r.size, MAX_SIZE);
        let r = PageRequest::new(Some(3), Some(0), &[]).unwrap();
        assert_eq!(r.page, 3);
        assert_eq!(r.size, 1);
        assert_eq!(PageRequest::default().size, DEFAULT_SIZE);
    }

    #[test]
    fn page_offset_must_fit_sql() {
        assert!(matches!(PageRequest::new(Some(u64::MAX), Some(20), &[]), Err(ServiceError::Validation(_))));
        assert!(PageRequest::new(Some(u64::MAX / 2 + 1), Some(1), &[]).is_err());
        let r = PageRequest::new(Some(3), Some(20), &[]).unwrap();
        assert_eq!(r.offset().unwrap(), 60);
        assert!(PageRequest { page: u64::MAX, size: 2, sort: Vec::new() }.offset().is_err());
    }

    #[test]
    fn sort_parsing() {
        let r = PageRequest::new(None, None, &["firstName,desc".into(), "lastName".into()]).unwrap();
        assert_eq!(r.sort, vec![SortOrder::desc("firstName"), SortOrder::asc("lastName")]);
        assert!(SortOrder::parse("name,sideways").is_err());
        assert_eq!(SortOrder::desc("year").to_param(), "year,desc");
    }

    #[test]
    fn default_sort_only_when_unsorted() {
        let r = PageRequest::default().or_sort(SortOrder::asc("year"));
        assert_eq!(r.sort, vec![SortOrder::asc("year")]);
        let r = PageRequest::new(None, None, &["title".into()]).unwrap().or_sort(SortOrder::asc("year"));
        assert_eq!(r.sort, vec![SortOrder::asc("title")]);
    }

    #[test]
    fn page_navigation_flags() {
        let p = Page { content: vec![1, 2], number: 0, size: 2, total_elements: 5, total_pages: 3 };
        assert!(p.has_next());
        assert!(!p.has_prev());
        let p = p.map(|x| x * 10);
        assert_eq!(p.content, vec![10, 20]);
    }
}

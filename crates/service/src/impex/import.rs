use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use models::{spex_category, tag, task, task_category};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use tracing::{info, instrument, warn};

use super::{is_spreadsheet, Resource};
use crate::dto::ImportResultDto;
use crate::errors::ServiceError;
use crate::permission::{self, ObjectClass};
use crate::services::{spex_category_service, tag_service, task_category_service, task_service};

enum Record {
    Tag { name: String },
    TaskCategory { name: String, has_actor: bool },
    SpexCategory { name: String, first_year: String },
    Task { name: String, category_id: Option<i64> },
}

struct Row {
    line: usize,
    id: Option<i64>,
    record: Record,
}

fn columns(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::Tag => &["Id", "Name"],
        Resource::TaskCategory => &["Id", "Name", "Has actor"],
        Resource::SpexCategory => &["Id", "Name", "First year"],
        Resource::Task => &["Id", "Name", "Category"],
        Resource::Spexare | Resource::Spex => &[],
    }
}

/// Validate every row of the resource's sheet, then write them all in one
/// transaction. Nothing is written when any row fails.
#[instrument(skip(db, bytes), fields(len = bytes.len()))]
pub async fn import<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    resource: Resource,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<ImportResultDto, ServiceError> {
    if !resource.importable() {
        return Err(ServiceError::Validation(format!("{} cannot be imported", resource.sheet_name())));
    }
    if !is_spreadsheet(content_type) {
        return Err(ServiceError::UnsupportedMedia(format!("cannot import '{content_type}'")));
    }
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| ServiceError::Validation(format!("unreadable spreadsheet: {e}")))?;
    let sheet = resource.sheet_name();
    if !workbook.sheet_names().iter().any(|n| n == sheet) {
        return Ok(failed(vec![format!("missing sheet '{sheet}'")]));
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| ServiceError::Validation(format!("unreadable sheet '{sheet}': {e}")))?;

    let (rows, mut messages) = parse(resource, &range);
    for row in &rows {
        if let Some(msg) = check_references(db, resource, row).await? {
            messages.push(msg);
        }
    }
    if !messages.is_empty() {
        warn!(resource = ?resource, problems = messages.len(), "import_rejected");
        return Ok(failed(messages));
    }

    let txn = db.begin().await?;
    for row in rows {
        apply(&txn, row).await?;
    }
    txn.commit().await?;
    info!(resource = ?resource, "import_done");
    Ok(ImportResultDto { success: true, messages: Vec::new() })
}

fn failed(messages: Vec<String>) -> ImportResultDto {
    ImportResultDto { success: false, messages }
}

fn text(cell: Option<&Data>) -> Option<String> {
    let s = match cell? {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    };
    (!s.is_empty()).then_some(s)
}

fn parse(resource: Resource, range: &Range<Data>) -> (Vec<Row>, Vec<String>) {
    let mut messages = Vec::new();
    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return (Vec::new(), vec![format!("sheet '{}' has no header row", resource.sheet_name())]);
    };
    let index: HashMap<String, usize> = header.iter().enumerate().filter_map(|(i, c)| text(Some(c)).map(|t| (t, i))).collect();
    let missing: Vec<&str> = columns(resource).iter().copied().filter(|c| !index.contains_key(*c)).collect();
    if !missing.is_empty() {
        return (Vec::new(), vec![format!("missing columns: {}", missing.join(", "))]);
    }

    let mut rows = Vec::new();
    for (i, cells) in lines.enumerate() {
        let line = i + 2;
        let get = |col: &str| index.get(col).and_then(|&i| text(cells.get(i)));
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        match parse_row(resource, &get) {
            Ok((id, record)) => rows.push(Row { line, id, record }),
            Err(e) => messages.push(format!("row {line}: {e}")),
        }
    }
    (rows, messages)
}

fn parse_row(resource: Resource, get: &dyn Fn(&str) -> Option<String>) -> Result<(Option<i64>, Record), String> {
    let id = optional_int(get("Id"), "Id")?;
    let name = get("Name").unwrap_or_default();
    let record = match resource {
        Resource::Tag => {
            tag::validate_name(&name).map_err(|e| e.to_string())?;
            Record::Tag { name }
        }
        Resource::TaskCategory => {
            task_category::validate_name(&name).map_err(|e| e.to_string())?;
            let has_actor = match get("Has actor").map(|v| v.to_ascii_lowercase()).as_deref() {
                None | Some("false") | Some("0") | Some("no") => false,
                Some("true") | Some("1") | Some("yes") => true,
                Some(other) => return Err(format!("invalid 'Has actor' value '{other}'")),
            };
            Record::TaskCategory { name, has_actor }
        }
        Resource::SpexCategory => {
            let first_year = get("First year").unwrap_or_default();
            spex_category::validate_name(&name).map_err(|e| e.to_string())?;
            spex_category::validate_first_year(&first_year).map_err(|e| e.to_string())?;
            Record::SpexCategory { name, first_year }
        }
        Resource::Task => {
            task::validate_name(&name).map_err(|e| e.to_string())?;
            Record::Task { name, category_id: optional_int(get("Category"), "Category")? }
        }
        Resource::Spexare | Resource::Spex => return Err("not importable".into()),
    };
    Ok((id, record))
}

fn optional_int(raw: Option<String>, column: &str) -> Result<Option<i64>, String> {
    raw.map(|v| v.parse::<i64>().map_err(|_| format!("invalid '{column}' value '{v}'"))).transpose()
}

async fn check_references<C: ConnectionTrait>(db: &C, resource: Resource, row: &Row) -> Result<Option<String>, ServiceError> {
    if let Some(id) = row.id {
        let exists = match resource {
            Resource::Tag => tag_service::exists(db, id).await?,
            Resource::TaskCategory => task_category_service::exists(db, id).await?,
            Resource::SpexCategory => spex_category_service::exists(db, id).await?,
            Resource::Task => task_service::exists(db, id).await?,
            Resource::Spexare | Resource::Spex => false,
        };
        if !exists {
            return Ok(Some(format!("row {}: {} {id} does not exist", row.line, resource.sheet_name())));
        }
    }
    if let Record::Task { category_id: Some(cid), .. } = row.record {
        if !task_category_service::exists(db, cid).await? {
            return Ok(Some(format!("row {}: task category {cid} does not exist", row.line)));
        }
    }
    Ok(None)
}

async fn apply<C: ConnectionTrait>(db: &C, row: Row) -> Result<(), ServiceError> {
    match (row.id, row.record) {
        (Some(id), Record::Tag { name }) => {
            let mut am: tag::ActiveModel = find(db, tag::Entity::find_by_id(id), "tag", id).await?.into();
            am.name = Set(name);
            am.update(db).await?;
        }
        (None, Record::Tag { name }) => {
            let m = tag::ActiveModel { name: Set(name), ..Default::default() }.insert(db).await?;
            permission::grant_defaults(db, ObjectClass::Tag, m.id).await?;
        }
        (Some(id), Record::TaskCategory { name, has_actor }) => {
            let mut am: task_category::ActiveModel = find(db, task_category::Entity::find_by_id(id), "task category", id).await?.into();
            am.name = Set(name);
            am.has_actor = Set(has_actor);
            am.update(db).await?;
        }
        (None, Record::TaskCategory { name, has_actor }) => {
            let m = task_category::ActiveModel { name: Set(name), has_actor: Set(has_actor), ..Default::default() }.insert(db).await?;
            permission::grant_defaults(db, ObjectClass::TaskCategory, m.id).await?;
        }
        (Some(id), Record::SpexCategory { name, first_year }) => {
            let mut am: spex_category::ActiveModel = find(db, spex_category::Entity::find_by_id(id), "spex category", id).await?.into();
            am.name = Set(name);
            am.first_year = Set(first_year);
            am.update(db).await?;
        }
        (None, Record::SpexCategory { name, first_year }) => {
            let m = spex_category::ActiveModel { name: Set(name), first_year: Set(first_year), ..Default::default() }.insert(db).await?;
            permission::grant_defaults(db, ObjectClass::SpexCategory, m.id).await?;
        }
        (Some(id), Record::Task { name, category_id }) => {
            let mut am: task::ActiveModel = find(db, task::Entity::find_by_id(id), "task", id).await?.into();
            am.name = Set(name);
            am.category_id = Set(category_id);
            am.update(db).await?;
        }
        (None, Record::Task { name, category_id }) => {
            let m = task::ActiveModel { name: Set(name), category_id: Set(category_id), ..Default::default() }.insert(db).await?;
            permission::grant_defaults(db, ObjectClass::Task, m.id).await?;
        }
    }
    Ok(())
}

async fn find<C: ConnectionTrait, E: EntityTrait>(db: &C, select: sea_orm::Select<E>, entity: &str, id: i64) -> Result<E::Model, ServiceError> {
    select.one(db).await?.ok_or_else(|| ServiceError::not_found_id(entity, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impex::export;
    use crate::services::tag_service::TagCreateDto;
    use crate::test_support::{get_db, ALL_ROLES};
    use common::media::APPLICATION_XLSX;
    use rust_xlsxwriter::Workbook;

    fn workbook(sheet: &str, rows: &[&[&str]]) -> Vec<u8> {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name(sheet).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_empty() {
                    ws.write_string(r as u32, c as u16, *v).unwrap();
                }
            }
        }
        wb.save_to_buffer().unwrap()
    }

    #[tokio::test]
    async fn import_creates_and_updates_tags() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let existing = tag_service::create(&db, TagCreateDto { name: "Gammal".into() }).await?;
        let id = existing.id.to_string();
        let bytes = workbook("Tags", &[&["Id", "Name"], &[&id, "Ny"], &["", "Helt ny"]]);

        let result = import(&db, Resource::Tag, APPLICATION_XLSX, bytes).await?;
        assert!(result.success, "{:?}", result.messages);
        let tags = tag_service::find_for_export(&db, ALL_ROLES, &[]).await?;
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ny", "Helt ny"]);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_rows_abort_the_whole_import() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let bytes = workbook("Task categories", &[&["Id", "Name", "Has actor"], &["", "Scen", "true"], &["424242", "Ljud", "no"], &["", "", ""], &["", "Bygg", "maybe"]]);

        let result = import(&db, Resource::TaskCategory, APPLICATION_XLSX, bytes).await?;
        assert!(!result.success);
        assert_eq!(result.messages.len(), 2);
        assert!(task_category_service::find_for_export(&db, ALL_ROLES, &[]).await?.is_empty());

        let missing = import(&db, Resource::TaskCategory, APPLICATION_XLSX, workbook("Other", &[&["Id"]])).await?;
        assert_eq!(missing.messages, vec!["missing sheet 'Task categories'".to_string()]);
        assert!(matches!(import(&db, Resource::Tag, "text/csv", Vec::new()).await, Err(ServiceError::UnsupportedMedia(_))));
        Ok(())
    }

    #[tokio::test]
    async fn export_writes_header_and_rows() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        tag_service::create(&db, TagCreateDto { name: "Orkester".into() }).await?;
        let bytes = export(&db, ALL_ROLES, Resource::Tag, &[]).await?;

        let mut wb = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = wb.worksheet_range("Tags")?;
        let rows: Vec<_> = range.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(text(rows[0].first()).as_deref(), Some("Id"));
        assert_eq!(text(rows[1].get(1)).as_deref(), Some("Orkester"));
        Ok(())
    }
}

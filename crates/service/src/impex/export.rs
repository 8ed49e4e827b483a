use rust_xlsxwriter::{Format, Workbook, XlsxError};
use sea_orm::ConnectionTrait;
use tracing::{info, instrument};

use super::Resource;
use crate::dto::AuditDto;
use crate::errors::ServiceError;
use crate::permission::Role;
use crate::services::spex_service::SpexDto;
use crate::services::{spex_category_service, spex_service, spexare_service, tag_service, task_category_service, task_service};

const AUDIT_HEADER: [&str; 4] = ["Created by", "Created at", "Last modified by", "Last modified at"];

enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl From<Option<String>> for Cell {
    fn from(v: Option<String>) -> Self {
        v.map(Cell::Text).unwrap_or(Cell::Empty)
    }
}

impl From<Option<i64>> for Cell {
    fn from(v: Option<i64>) -> Self {
        v.map(|n| Cell::Number(n as f64)).unwrap_or(Cell::Empty)
    }
}

struct Sheet {
    name: &'static str,
    header: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &'static str, columns: &[&'static str]) -> Self {
        let mut header = columns.to_vec();
        header.extend(AUDIT_HEADER);
        Self { name, header, rows: Vec::new() }
    }

    fn push(&mut self, mut cells: Vec<Cell>, audit: &AuditDto) {
        cells.push(Cell::Text(audit.created_by.clone()));
        cells.push(Cell::Text(audit.created_at.to_rfc3339()));
        cells.push(audit.last_modified_by.clone().into());
        cells.push(audit.last_modified_at.map(|t| t.to_rfc3339()).into());
        self.rows.push(cells);
    }
}

/// Build an xlsx workbook for `resource`; an empty `ids` exports every readable row.
#[instrument(skip(db, roles))]
pub async fn export<C: ConnectionTrait>(db: &C, roles: &[Role], resource: Resource, ids: &[i64]) -> Result<Vec<u8>, ServiceError> {
    let sheets = match resource {
        Resource::Spexare => vec![spexare_sheet(db, ids).await?],
        Resource::Spex => spex_sheets(db, roles, ids).await?,
        Resource::SpexCategory => {
            let mut sheet = category_sheet(Resource::SpexCategory.sheet_name());
            for c in spex_category_service::find_for_export(db, roles, ids).await? {
                sheet.push(vec![Cell::Number(c.id as f64), Cell::Text(c.name.clone()), Cell::Text(c.first_year.clone())], &c.audit);
            }
            vec![sheet]
        }
        Resource::Task => task_sheets(db, roles, ids).await?,
        Resource::TaskCategory => {
            let mut sheet = Sheet::new(Resource::TaskCategory.sheet_name(), &["Id", "Name", "Has actor"]);
            for c in task_category_service::find_for_export(db, roles, ids).await? {
                sheet.push(vec![Cell::Number(c.id as f64), Cell::Text(c.name.clone()), Cell::Bool(c.has_actor)], &c.audit);
            }
            vec![sheet]
        }
        Resource::Tag => {
            let mut sheet = Sheet::new(Resource::Tag.sheet_name(), &["Id", "Name"]);
            for t in tag_service::find_for_export(db, roles, ids).await? {
                sheet.push(vec![Cell::Number(t.id as f64), Cell::Text(t.name.clone())], &t.audit);
            }
            vec![sheet]
        }
    };
    let bytes = render(&sheets).map_err(|e| ServiceError::Internal(format!("spreadsheet: {e}")))?;
    info!(resource = ?resource, bytes = bytes.len(), "export_done");
    Ok(bytes)
}

fn category_sheet(name: &'static str) -> Sheet {
    Sheet::new(name, &["Id", "Name", "First year"])
}

async fn spexare_sheet<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<Sheet, ServiceError> {
    let mut sheet = Sheet::new(
        Resource::Spexare.sheet_name(),
        &["Id", "First name", "Last name", "Nick name", "Social security number", "Graduation", "Comment", "Partner"],
    );
    for m in spexare_service::find_for_export(db, ids).await? {
        let dto = spexare_service::SpexareDto::from(m);
        sheet.push(
            vec![
                Cell::Number(dto.id as f64),
                Cell::Text(dto.first_name.clone()),
                Cell::Text(dto.last_name.clone()),
                dto.nick_name.clone().into(),
                dto.social_security_number.clone().into(),
                dto.graduation.clone().into(),
                dto.comment.clone().into(),
                dto.partner_id.into(),
            ],
            &dto.audit,
        );
    }
    Ok(sheet)
}

fn spex_row(s: &SpexDto) -> Vec<Cell> {
    vec![
        Cell::Number(s.id as f64),
        Cell::Text(s.year.clone()),
        Cell::Text(s.title.clone()),
        s.parent_id.into(),
        s.category_id.into(),
    ]
}

async fn spex_sheets<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<Sheet>, ServiceError> {
    const COLUMNS: [&str; 5] = ["Id", "Year", "Title", "Parent", "Category"];
    let spex = spex_service::find_for_export(db, roles, ids, false).await?;
    let revivals = spex_service::find_for_export(db, roles, ids, true).await?;

    let mut main = Sheet::new(Resource::Spex.sheet_name(), &COLUMNS);
    for s in &spex {
        main.push(spex_row(s), &s.audit);
    }
    let mut revival_sheet = Sheet::new("Revivals", &COLUMNS);
    for r in &revivals {
        revival_sheet.push(spex_row(r), &r.audit);
    }

    let mut categories = category_sheet("Categories");
    let category_ids: Vec<i64> = spex.iter().filter_map(|s| s.category_id).collect();
    if ids.is_empty() || !category_ids.is_empty() {
        let scope = if ids.is_empty() { Vec::new() } else { category_ids };
        for c in spex_category_service::find_for_export(db, roles, &scope).await? {
            categories.push(vec![Cell::Number(c.id as f64), Cell::Text(c.name.clone()), Cell::Text(c.first_year.clone())], &c.audit);
        }
    }
    Ok(vec![main, revival_sheet, categories])
}

async fn task_sheets<C: ConnectionTrait>(db: &C, roles: &[Role], ids: &[i64]) -> Result<Vec<Sheet>, ServiceError> {
    let tasks = task_service::find_for_export(db, roles, ids).await?;
    let mut main = Sheet::new(Resource::Task.sheet_name(), &["Id", "Name", "Category"]);
    for t in &tasks {
        main.push(vec![Cell::Number(t.id as f64), Cell::Text(t.name.clone()), t.category_id.into()], &t.audit);
    }

    let mut categories = Sheet::new("Categories", &["Id", "Name", "Has actor"]);
    let category_ids: Vec<i64> = tasks.iter().filter_map(|t| t.category_id).collect();
    if ids.is_empty() || !category_ids.is_empty() {
        let scope = if ids.is_empty() { Vec::new() } else { category_ids };
        for c in task_category_service::find_for_export(db, roles, &scope).await? {
            categories.push(vec![Cell::Number(c.id as f64), Cell::Text(c.name.clone()), Cell::Bool(c.has_actor)], &c.audit);
        }
    }
    Ok(vec![main, categories])
}

fn render(sheets: &[Sheet]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    for sheet in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name)?;
        for (col, title) in sheet.header.iter().enumerate() {
            ws.write_string_with_format(0, col as u16, *title, &bold)?;
        }
        for (i, row) in sheet.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Text(s) => {
                        ws.write_string(r, c, s.as_str())?;
                    }
                    Cell::Number(n) => {
                        ws.write_number(r, c, *n)?;
                    }
                    Cell::Bool(b) => {
                        ws.write_boolean(r, c, *b)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    workbook.save_to_buffer()
}

//! Shapes shared by the resource DTOs.

use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// The four audit columns every resource exposes.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditDto {
    pub created_by: String,
    pub created_at: DateTimeWithTimeZone,
    pub last_modified_by: Option<String>,
    pub last_modified_at: Option<DateTimeWithTimeZone>,
}

/// Build an [`AuditDto`] from any model carrying the audit columns.
#[macro_export]
macro_rules! audit_of {
    ($m:expr) => {
        $crate::dto::AuditDto {
            created_by: $m.created_by.clone(),
            created_at: $m.created_at,
            last_modified_by: $m.last_modified_by.clone(),
            last_modified_at: $m.last_modified_at,
        }
    };
}

/// Outcome of a spreadsheet import.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Default)]
pub struct ImportResultDto {
    pub success: bool,
    pub messages: Vec<String>,
}

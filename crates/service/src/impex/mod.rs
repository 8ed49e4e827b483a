//! Spreadsheet export and import of the registry resources.

mod export;
mod import;

use common::media::{essence, APPLICATION_XLS, APPLICATION_XLSX};

use crate::errors::ServiceError;

pub use export::export;
pub use import::import;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Spexare,
    Spex,
    SpexCategory,
    Task,
    TaskCategory,
    Tag,
}

impl Resource {
    /// Name of the primary sheet, also used as the attachment file name.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Resource::Spexare => "Spexare",
            Resource::Spex => "Spex",
            Resource::SpexCategory => "Spex categories",
            Resource::Task => "Tasks",
            Resource::TaskCategory => "Task categories",
            Resource::Tag => "Tags",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.xlsx", self.sheet_name().to_lowercase().replace(' ', "-"))
    }

    pub fn importable(self) -> bool {
        matches!(self, Resource::SpexCategory | Resource::Task | Resource::TaskCategory | Resource::Tag)
    }
}

/// Only xlsx is written; asking for legacy xls is a 406.
pub fn check_export_type(media_type: &str) -> Result<(), ServiceError> {
    match essence(media_type).as_str() {
        APPLICATION_XLSX => Ok(()),
        other => Err(ServiceError::NotAcceptable(format!("cannot export as '{other}'"))),
    }
}

pub fn is_spreadsheet(media_type: &str) -> bool {
    matches!(essence(media_type).as_str(), APPLICATION_XLSX | APPLICATION_XLS)
}

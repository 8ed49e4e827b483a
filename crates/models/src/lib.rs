pub mod errors;
pub mod db;
pub mod audit;
pub mod validation;
pub mod event;
pub mod acl_entry;
pub mod types;
pub mod spexare;
pub mod activity;
pub mod spex_category;
pub mod spex_details;
pub mod spex;
pub mod spex_activity;
pub mod task_category;
pub mod task;
pub mod task_activity;
pub mod actor;
pub mod tag;
pub mod tagging;
pub mod address;
pub mod membership;
pub mod consent;
pub mod toggle;

#[cfg(test)]
mod tests;

pub mod activity_service;
pub mod actor_service;
pub mod address_service;
pub mod consent_service;
pub mod event_service;
pub mod membership_service;
pub mod scope;
pub mod spex_activity_service;
pub mod spex_category_service;
pub mod spex_service;
pub mod spexare_service;
pub mod tag_service;
pub mod tagging_service;
pub mod task_activity_service;
pub mod task_category_service;
pub mod task_service;
pub mod toggle_service;
pub mod type_service;

//! Business operations of the register on top of the `models` entities.
//! - Every nested resource is reached through its parent chain.
//! - Filtering, paging and search are shared across resources.
//! - Errors are typed so the HTTP layer can map them to statuses.

pub mod dto;
pub mod errors;
pub mod filter;
pub mod impex;
pub mod pagination;
pub mod patch;
pub mod permission;
pub mod search;
pub mod services;
#[cfg(test)]
pub mod test_support;

pub mod auth;
pub mod errors;
pub mod extract;
pub mod hal;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod startup;

pub use startup::run;

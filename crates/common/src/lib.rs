pub mod media;
pub mod types;
pub mod utils;

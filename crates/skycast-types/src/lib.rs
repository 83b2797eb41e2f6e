pub mod api;
pub mod location;
pub mod models;

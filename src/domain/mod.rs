pub mod models;
pub mod position;

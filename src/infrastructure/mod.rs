pub mod ai;
pub mod identity;
pub mod store;

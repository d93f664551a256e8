pub mod models;
pub mod recovery;
pub mod store;

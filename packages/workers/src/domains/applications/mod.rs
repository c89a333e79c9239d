// Applications domain - applications and the job postings they point at

pub mod models;

pub use models::*;

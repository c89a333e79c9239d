// Audit domain - append-only record of state changes made by the workers

pub mod models;

pub use models::*;

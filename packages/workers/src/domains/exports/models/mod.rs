pub mod export_job;

pub use export_job::*;

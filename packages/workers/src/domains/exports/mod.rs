// Exports domain - CSV exports of a posting's applications

pub mod models;
pub mod pipeline;
pub mod queue;
pub mod utils;

pub use models::*;
pub use pipeline::ExportPipeline;
pub use queue::ExportJobQueue;

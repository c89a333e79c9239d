// Resumes domain - parsing uploaded resumes and scoring the candidate's applications

pub mod models;
pub mod pipeline;
pub mod queue;
pub mod utils;

pub use models::*;
pub use pipeline::{ParsePipeline, ScoringReport};
pub use queue::ResumeDocumentQueue;

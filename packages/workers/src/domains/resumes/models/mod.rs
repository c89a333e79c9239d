pub mod resume_document;

pub use resume_document::*;

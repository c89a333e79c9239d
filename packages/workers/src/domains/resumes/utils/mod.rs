pub mod resume_text;

pub use resume_text::resume_text;

pub mod application;
pub mod job_posting;

pub use application::{Application, ApplicationExportRow, ScorableApplication};
pub use job_posting::{skill_names, JobRequirements};

pub mod applications;
pub mod audit;
pub mod exports;
pub mod matching;
pub mod resumes;

// Recruiting Workers - Core
//
// Background workers for the recruiting backend. Each worker polls a table
// used as a job queue, claims rows with a conditional update and runs a
// pipeline per claimed row:
//
// - exporter: posting applications → CSV in object storage
// - parser: uploaded resume → parse result → candidate fit scores

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;

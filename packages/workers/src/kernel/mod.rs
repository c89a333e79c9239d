//! Kernel module - worker infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod shutdown;
pub mod storage_client;
pub mod test_dependencies;
pub mod traits;

pub use deps::{AffindaAdapter, WorkerDeps};
pub use shutdown::install_shutdown_handler;
pub use storage_client::SupabaseStorage;
pub use traits::*;

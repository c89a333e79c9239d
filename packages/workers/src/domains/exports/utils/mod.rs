pub mod export_csv;

pub use export_csv::{export_path, render_applications_csv};

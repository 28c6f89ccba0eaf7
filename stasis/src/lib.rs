pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{build_config_from_args, handle_mirror, render_report, report_format};

pub mod config;
pub mod fingerprint;
pub mod mapping;
pub mod mirror;
pub mod report;
pub mod rewrite;

pub use config::MirrorConfig;
pub use mapping::NameMapping;
pub use mirror::{MirrorOutcome, MirrorProgressCallback, execute_mirror, run_pipeline};

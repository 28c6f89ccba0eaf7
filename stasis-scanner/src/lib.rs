pub mod crawler;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod normalize;
pub mod output;
pub mod result;
pub mod sanitize;
pub mod transport;

pub use crawler::{CrawlOutcome, Crawler, ProgressCallback};
pub use error::{MirrorError, Result};
pub use frontier::{Frontier, LinkRecord};
pub use output::OutputDir;
pub use result::{ContentKind, FetchedPage};
pub use transport::{FetchResponse, HttpTransport, Transport};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url}: status_code = {status}")]
    FetchFailure { url: String, status: u16 },

    #[error("Malformed link at byte {offset}: no delimiter after {context:?}")]
    MalformedLink { offset: usize, context: String },

    #[error("{path} declared UTF-8 but is not valid UTF-8")]
    Decode { path: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Path visited twice: {0}")]
    AlreadyVisited(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MirrorError>;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("Rate limited on {url} after {attempts} retries")]
    Throttled { url: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TrackerError {
    /// True for failures caused by the remote side (status, throttling, network).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TrackerError::Http(_) | TrackerError::HttpStatus { .. } | TrackerError::Throttled { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

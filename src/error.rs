use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Script URL not found in page HTML")]
    ScriptNotFound,

    #[error("Pattern not found in script: {0}")]
    PatternNotFound(String),

    #[error("Could not repair {what} into JSON: {reason}")]
    Repair { what: String, reason: String },

    #[error("Unexpected shape for {what}: {reason}")]
    Interpret { what: String, reason: String },

    #[error("Upstream data not ready: {0}")]
    DataNotReady(String),

    #[error("Gave up on items after all retry rounds: {0:?}")]
    RetriesExhausted(Vec<u32>),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether another attempt at the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited(_) | Error::Http(_) => true,
            Error::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

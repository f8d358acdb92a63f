use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a single fetch-decode attempt.
///
/// The station treats every variant the same way: the attempt is counted and
/// retried while budget remains. The split only matters for logging.
#[derive(Debug, Error)]
pub enum Error {
    #[error("server answered with HTTP status {0}")]
    Status(u16),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("malformed JSON payload: {0}")]
    Parse(String),

    #[error("payload of {len} bytes exceeds the {limit} byte parse buffer")]
    PayloadTooLarge { len: usize, limit: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Non-200 status or connection failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Status(_) | Error::Connection(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::PayloadTooLarge { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Connection(e.to_string())
    }
}

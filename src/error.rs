use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub rejected the access token: {0}")]
    Auth(String),

    #[error("Transient fetch error: {0}")]
    Transient(String),

    #[error("GitHub API rate limit hit")]
    RateLimited { retry_after: Option<u64> },

    #[error("Repository {0} is empty")]
    EmptyRepository(String),

    #[error("GitHub API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }

    /// Seconds the server asked us to wait, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.is_server_error() => Error::Transient(err.to_string()),
            Some(status) => Error::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => Error::Transient(format!("truncated response body: {err}")),
            None => Error::Transient(err.to_string()),
        }
    }
}

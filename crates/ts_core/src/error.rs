use thiserror::Error;

/// Coarse classification of an [`Error`], shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Upstream,
    Network,
    ExtractionFailed,
    EmptyResponse,
    EmptyStream,
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    /// A provider credential is missing. Raised before any network call.
    #[error("{0}")]
    Config(String),

    /// The request was malformed and never reached a provider.
    #[error("{0}")]
    Validation(String),

    /// The provider answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Timeout or no response from the provider.
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("{0}")]
    EmptyResponse(String),

    #[error("{0}")]
    EmptyStream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Upstream { .. } => ErrorKind::Upstream,
            Error::Network(_) => ErrorKind::Network,
            Error::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            Error::EmptyResponse(_) => ErrorKind::EmptyResponse,
            Error::EmptyStream(_) => ErrorKind::EmptyStream,
            Error::Serialization(_) | Error::External(_) => ErrorKind::Internal,
        }
    }

    /// Provider status code, only set for [`Error::Upstream`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Error::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        if err.is_timeout() {
            Error::Network(format!("Request timed out: {}", err))
        } else if err.is_decode() {
            Error::External(anyhow::anyhow!("Malformed provider response: {}", err))
        } else {
            Error::Network(format!("Network error: {}", err))
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: HTTP {status}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
    },

    #[error("{context}: malformed response: {message}")]
    Malformed { context: String, message: String },

    #[error("{0}")]
    Plex(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }

    /// Flatten an anyhow error chain from the Plex HTTP layer
    pub fn plex(err: anyhow::Error) -> Self {
        SourceError::Plex(format!("{:#}", err))
    }

    pub(crate) fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        SourceError::Http {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Malformed {
            context: context.into(),
            message: message.into(),
        }
    }
}

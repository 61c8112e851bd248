//! Error types for the FreeDNS TXT client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Connection failure or any non-200 response
    #[error("transport error: {0}")]
    Transport(String),

    /// No zone in the account owns the requested domain
    #[error("domain not managed by this FreeDNS account: {0}")]
    DomainNotManaged(String),

    /// No TXT record matched name and content
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Save page came back with a "Problems" title
    #[error("FreeDNS rejected the submission: {0}")]
    SubmissionRejected(String),

    /// Missing or unusable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Unrecoverable errors abort the current domain's validation;
    /// the host must not retry them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DomainNotManaged(_) | Self::Config(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL so query strings never reach logs
        Self::Transport(err.without_url().to_string())
    }
}

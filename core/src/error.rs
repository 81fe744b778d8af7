use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    /// The posting store could not be reached. Fatal to index construction.
    #[error("posting store unreachable at {target}: {reason}")]
    Connection { target: String, reason: String },

    /// The store answered but its contents could not be read or written.
    #[error("posting store error: {0}")]
    Store(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corpus is empty")]
    EmptyCorpus,
}

impl MatchError {
    pub fn connection(target: impl Into<String>, reason: impl ToString) -> Self {
        MatchError::Connection { target: target.into(), reason: reason.to_string() }
    }
}

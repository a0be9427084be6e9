use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecsysError>;

#[derive(Debug, Error)]
pub enum RecsysError {
    /// A tabular source could not be read or parsed.
    #[error("failed to load data: {0}")]
    DataLoad(String),

    /// Model fitting failed, typically on degenerate training data.
    #[error("training failed: {0}")]
    Training(String),

    /// An internal failure while assembling recommendations for a user.
    #[error("recommendation failed for user {user_id}: {reason}")]
    Recommendation { user_id: usize, reason: String },

    /// Inverse lookup of a dense id outside the fitted vocabulary.
    #[error("unknown {kind} id {id} (vocabulary size {size})")]
    UnknownId {
        kind: &'static str,
        id: usize,
        size: usize,
    },
}

impl From<csv::Error> for RecsysError {
    fn from(err: csv::Error) -> Self {
        RecsysError::DataLoad(err.to_string())
    }
}

impl From<std::io::Error> for RecsysError {
    fn from(err: std::io::Error) -> Self {
        RecsysError::DataLoad(err.to_string())
    }
}

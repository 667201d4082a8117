/// Errors raised while moving stores in and out of external formats.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The metadata parsed as JSON but violates the store contract. Nothing
    /// is partially constructed when this is returned.
    #[error("invalid store metadata: {message}")]
    Deserialize { message: String },

    #[error(transparent)]
    Columnar(#[from] facet_columnar::Error),
}

impl Error {
    pub(crate) fn deserialize(message: impl Into<String>) -> Self {
        Error::Deserialize {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

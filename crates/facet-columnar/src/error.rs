/// Errors surfaced by store construction and querying.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown field `{identifier}`")]
    UnknownField { identifier: String },

    #[error("duplicate field identifier `{identifier}`")]
    DuplicateField { identifier: String },

    #[error("duplicate indexed value `{key}` in field `{identifier}`")]
    DuplicateValue { identifier: String, key: String },

    #[error("row has {actual} cells but the store declares {expected} fields")]
    RowShapeMismatch { expected: usize, actual: usize },

    #[error("field `{identifier}` holds multiple values per row and cannot use unindexed storage")]
    MultiValuedUnindexed { identifier: String },

    #[error("row source failed: {source}")]
    Source {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wrap an external row-source failure.
    pub fn source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Source {
            source: Box::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

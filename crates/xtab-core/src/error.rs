use thiserror::Error;

#[derive(Debug, Error)]
pub enum XtabError {
    #[error("shape mismatch: {what} has length {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type XtabResult<T> = Result<T, XtabError>;

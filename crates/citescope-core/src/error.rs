use thiserror::Error;

/// All errors that can occur in citescope-core.
///
/// Everything downstream of a successfully parsed document is total:
/// per-record defects degrade to absent fields or skipped records rather
/// than errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid citation document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

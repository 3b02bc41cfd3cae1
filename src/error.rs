use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("series length mismatch: {field} has {actual} values, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid project id: {0}")]
    InvalidProjectId(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("sso backend error: {0}")]
    Sso(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;

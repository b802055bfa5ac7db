use std::io;

/// All error types for the mesh conversion engine and its drivers.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },
    #[error("Empty result: {0}")]
    EmptyResult(String),
    #[error("Input error: {0}")]
    Input(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse classification a transport layer maps onto its own responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadInput,
    Unsupported,
    Empty,
    Internal,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::MalformedInput(_) | ConvertError::Input(_) => ErrorKind::BadInput,
            ConvertError::UnsupportedConversion { .. } => ErrorKind::Unsupported,
            ConvertError::EmptyResult(_) => ErrorKind::Empty,
            ConvertError::Output(_) | ConvertError::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

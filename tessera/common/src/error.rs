use thiserror::Error;

use crate::logical_type::LogicalType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: LogicalType,
        actual: LogicalType,
    },
}

pub type ValueResult<T> = Result<T, ValueError>;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("truncated frame")]
    Truncated,
}

pub type FrameResult<T> = Result<T, FrameError>;

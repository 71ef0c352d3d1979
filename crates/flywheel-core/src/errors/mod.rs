//! Error families for the pipeline, aggregated into [`FlywheelError`].
//!
//! Row-level rejections (malformed samples, low-confidence filtering) are NOT
//! errors: they are reason codes carried as data. Only conditions that stop
//! a phase or the whole run surface here.

mod storage_error;

pub use storage_error::StorageError;

/// Top-level error type aggregating all subsystem error families.
#[derive(Debug, thiserror::Error)]
pub enum FlywheelError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type FlywheelResult<T> = Result<T, FlywheelError>;

//! # flywheel-storage
//!
//! SQLite persistence for the learning-telemetry pipeline: a single write
//! connection with WAL pragmas, versioned migrations, per-table query
//! modules, and the append-only run audit log.

pub mod engine;
pub mod migrations;
pub mod pragmas;
pub mod queries;

pub use engine::StorageEngine;

use flywheel_core::errors::{FlywheelError, StorageError};

/// Map an arbitrary storage failure message into the shared error type.
pub fn to_storage_err(message: impl Into<String>) -> FlywheelError {
    FlywheelError::Storage(StorageError::SqliteError {
        message: message.into(),
    })
}

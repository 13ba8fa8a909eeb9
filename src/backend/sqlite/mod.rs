//! SQLite adapter for the [`crate::Backend`] contract.
//!
//! Mutations run as `BEGIN IMMEDIATE` read-merge-write transactions so
//! concurrent writers on other connections cannot lose updates.
//! Enumerations stream with keyset pagination instead of materializing
//! whole tables.

mod impl_;
mod paging;

pub use impl_::SqliteBackend;

use crate::errors::GraphError;

/// Translates a storage failure into the crate taxonomy.
pub(crate) fn storage_error(err: rusqlite::Error) -> GraphError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => GraphError::not_found("no matching row"),
        rusqlite::Error::SqliteFailure(code, message)
            if matches!(
                code.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            GraphError::unavailable(format!(
                "database busy: {}",
                message.unwrap_or_else(|| code.to_string())
            ))
        }
        other => GraphError::unavailable(other.to_string()),
    }
}

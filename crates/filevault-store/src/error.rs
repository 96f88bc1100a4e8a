//! Record-store error types.
//!
//! Every public API in this crate surfaces errors through [`StoreError`].
//! Storage faults are propagated to callers unmodified — retry policy, if
//! any, lives here rather than in the access-control core.

/// Unified error type for the Filevault record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    // -- Record errors ------------------------------------------------------
    /// The requested vault does not exist.
    #[error("vault not found: id={vault_id}")]
    VaultNotFound { vault_id: String },

    /// The requested file record does not exist.
    #[error("file not found: id={file_id}")]
    FileNotFound { file_id: String },

    /// A stored vault row violates the security-policy invariants (e.g. both
    /// geo and time flags set, a tier without a password hash, a geofence
    /// with no radius). Corrupt rows are rejected, never repaired.
    #[error("corrupt security policy for vault {vault_id}: {reason}")]
    CorruptPolicy { vault_id: String, reason: String },

    /// Database schema migration failed.
    #[error("migration failed: {reason}")]
    MigrationFailed { reason: String },

    // -- Underlying errors --------------------------------------------------
    /// SQLite error from `rusqlite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Generic ------------------------------------------------------------
    /// Catch-all for unexpected internal errors that don't fit a specific
    /// variant.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

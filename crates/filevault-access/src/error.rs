//! Access-control error types.
//!
//! All public APIs in this crate surface errors through [`AccessError`].
//! Note that a failed gate check is *not* an error: the evaluator reports it
//! as a [`Deny`](crate::evaluate::AccessDecision::Deny) decision with a
//! machine-readable reason. Errors are reserved for invalid mutation input,
//! crypto failures, and storage faults propagated from the record store.

/// Unified error type for the Filevault access-control core.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    // -- Validation errors --------------------------------------------------
    /// A policy mutation was given invalid input (bad coordinates, zero
    /// radius, malformed timestamp, empty password). The stored policy is
    /// left untouched.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // -- Crypto errors ------------------------------------------------------
    /// Password hashing failed (e.g. the system CSPRNG was unavailable).
    #[error("password hashing failed: {reason}")]
    HashingFailed { reason: String },

    // -- Collaborator errors ------------------------------------------------
    /// The referenced vault does not exist in the record store.
    #[error("vault not found: id={vault_id}")]
    VaultNotFound { vault_id: String },

    /// A storage fault from the record store, propagated unmodified. Retry
    /// policy belongs to the store, not to this core.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Convenience alias used throughout the access crate.
pub type Result<T> = std::result::Result<T, AccessError>;

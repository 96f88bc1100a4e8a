//! SQLite-backed record store for Filevault.
//!
//! This crate owns the persistence side of the file-vault application:
//! vault records with their embedded security policies, file metadata, and
//! the unlock audit log. The access-control decisions themselves live in
//! `filevault-access`; this crate stores their inputs and outcomes.
//!
//! # Modules
//!
//! - [`store`] — SQLite vault/file/unlock-log CRUD.
//! - [`bridge`] — [`SharedVaultStore`], the `PolicyStore` implementation
//!   handed to the access core's unlock flow.
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust
//! use filevault_store::VaultStore;
//! use filevault_access::VaultSecurityPolicy;
//!
//! # fn example() -> filevault_store::Result<()> {
//! let store = VaultStore::open_in_memory()?;
//!
//! let vault = store.create_vault("holiday photos", "user-1")?;
//! store.add_file(&vault.id, "beach.png", "image/png", 120_000)?;
//!
//! // Lock the vault behind a password.
//! let policy = VaultSecurityPolicy::enable_password_only("sesame")
//!     .expect("valid password");
//! store.put_vault_policy(&vault.id, &policy)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod bridge;
pub mod error;
pub mod store;

// Re-export the most commonly used types at the crate root for convenience.
pub use bridge::SharedVaultStore;
pub use error::{Result, StoreError};
pub use store::{FileRecord, UnlockEntry, VaultRecord, VaultStore};

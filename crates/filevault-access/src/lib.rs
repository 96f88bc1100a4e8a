//! Vault access-control core for Filevault.
//!
//! Filevault keeps user files in named vaults that can be protected by
//! layered gates: an optional time lock or geofence, always combined with a
//! password. This crate decides, given a vault's configured
//! [`VaultSecurityPolicy`] and the [`AccessEvidence`] a client supplies at
//! unlock time, whether access is granted.
//!
//! # Modules
//!
//! - [`policy`] — the tagged security-policy model and its mutation ops.
//! - [`evaluate`] — the pure gate evaluator (time → geo → password).
//! - [`geo`] — coordinates and Haversine great-circle distance.
//! - [`hash`] — salted one-way password hashing (PBKDF2 via `ring`).
//! - [`evidence`] — async collaborators: position sensor, clock, prompt.
//! - [`unlock`] — the unlock flow over a [`PolicyStore`].
//! - [`error`] — unified error types.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use filevault_access::{AccessDecision, AccessEvidence, VaultSecurityPolicy, evaluate};
//! use filevault_access::geo::Coordinates;
//!
//! # fn example() -> filevault_access::Result<()> {
//! // Fence the vault to 500 m around a point, password required.
//! let policy = VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 500, "sesame")?;
//!
//! // A client inside the fence with the right password gets in.
//! let evidence = AccessEvidence {
//!     password_attempt: Some("sesame".into()),
//!     current_position: Some(Coordinates::new(40.001, -73.0)),
//!     now: Utc::now(),
//! };
//! assert_eq!(evaluate(&policy, &evidence), AccessDecision::Allow);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod error;
pub mod evaluate;
pub mod evidence;
pub mod geo;
pub mod hash;
pub mod policy;
pub mod unlock;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::{AccessError, Result};
pub use evaluate::{AccessDecision, AccessEvidence, DenyReason, evaluate};
pub use evidence::{Clock, CredentialPrompt, EvidenceCollector, PositionSensor, SystemClock};
pub use policy::VaultSecurityPolicy;
pub use unlock::{PolicyStore, UnlockService};

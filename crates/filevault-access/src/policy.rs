//! Vault security policy model and mutation operations.
//!
//! A vault's security is one of four mutually exclusive tiers, modeled as a
//! tagged enum so that inconsistent combinations (a geofence without a
//! radius, a time lock without a password) are unrepresentable:
//!
//! - [`NoSecurity`](VaultSecurityPolicy::NoSecurity) — the creation state.
//! - [`PasswordOnly`](VaultSecurityPolicy::PasswordOnly)
//! - [`GeoSecured`](VaultSecurityPolicy::GeoSecured) — geofence + password.
//! - [`TimeSecured`](VaultSecurityPolicy::TimeSecured) — time lock + password.
//!
//! Geo and time locks are never combined with each other, and the tiered
//! locks always carry a password hash. Enabling any tier replaces the entire
//! policy and re-hashes a freshly supplied password; there is no path that
//! reuses a previously stored hash.
//!
//! All mutation constructors validate their input and return
//! [`AccessError::InvalidInput`] without producing a policy, so a caller that
//! only persists the `Ok` value can never half-update a stored record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::geo::Coordinates;
use crate::hash;

/// The security policy attached to a vault record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum VaultSecurityPolicy {
    /// No gates enabled; access is always granted.
    NoSecurity,

    /// A password is required at unlock.
    PasswordOnly {
        /// One-way salted hash of the vault password.
        password_hash: String,
    },

    /// The client must be inside a geofence, then supply the password.
    GeoSecured {
        /// Geofence center.
        center: Coordinates,
        /// Geofence radius in meters, always > 0.
        radius_meters: u32,
        /// One-way salted hash of the vault password.
        password_hash: String,
    },

    /// The vault stays locked until an instant passes, then the password is
    /// required.
    TimeSecured {
        /// The instant (UTC) after which the vault may be opened.
        unlock_at: DateTime<Utc>,
        /// One-way salted hash of the vault password.
        password_hash: String,
    },
}

impl Default for VaultSecurityPolicy {
    fn default() -> Self {
        Self::NoSecurity
    }
}

impl VaultSecurityPolicy {
    // -- Mutation operations ------------------------------------------------

    /// Enable password-only security, clearing any geo or time lock.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidInput`] if `plaintext` is empty.
    pub fn enable_password_only(plaintext: &str) -> Result<Self> {
        validate_plaintext(plaintext)?;
        let password_hash = hash::hash_password(plaintext)?;

        tracing::info!(tier = "password", "vault security policy configured");
        Ok(Self::PasswordOnly { password_hash })
    }

    /// Enable a geofence lock combined with a password, clearing any time
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidInput`] if the coordinates are not
    /// finite WGS84 values, `radius_meters` is zero, or `plaintext` is empty.
    pub fn enable_geo_with_password(
        lat: f64,
        lng: f64,
        radius_meters: u32,
        plaintext: &str,
    ) -> Result<Self> {
        let center = Coordinates::new(lat, lng);
        center.validate()?;

        if radius_meters == 0 {
            return Err(AccessError::InvalidInput {
                reason: "geofence radius must be greater than zero".into(),
            });
        }

        validate_plaintext(plaintext)?;
        let password_hash = hash::hash_password(plaintext)?;

        tracing::info!(
            tier = "geo",
            center = %center,
            radius_meters = radius_meters,
            "vault security policy configured"
        );
        Ok(Self::GeoSecured {
            center,
            radius_meters,
            password_hash,
        })
    }

    /// Enable a time lock combined with a password, clearing any geofence.
    ///
    /// `unlock_at` is an RFC 3339 timestamp. Past instants are accepted: the
    /// gate is checked at unlock time, not at configuration time.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidInput`] if the timestamp does not parse
    /// or `plaintext` is empty.
    pub fn enable_time_with_password(unlock_at: &str, plaintext: &str) -> Result<Self> {
        let unlock_at = DateTime::parse_from_rfc3339(unlock_at)
            .map_err(|e| AccessError::InvalidInput {
                reason: format!("invalid unlock timestamp {unlock_at:?}: {e}"),
            })?
            .with_timezone(&Utc);

        validate_plaintext(plaintext)?;
        let password_hash = hash::hash_password(plaintext)?;

        tracing::info!(
            tier = "time",
            unlock_at = %unlock_at,
            "vault security policy configured"
        );
        Ok(Self::TimeSecured {
            unlock_at,
            password_hash,
        })
    }

    /// Remove all security, returning the vault to its creation state.
    pub fn disable_security() -> Self {
        tracing::info!(tier = "none", "vault security policy cleared");
        Self::NoSecurity
    }

    // -- Accessors ------------------------------------------------------------

    /// The tier name stored and logged for this policy.
    pub fn tier(&self) -> &'static str {
        match self {
            Self::NoSecurity => "none",
            Self::PasswordOnly { .. } => "password",
            Self::GeoSecured { .. } => "geo",
            Self::TimeSecured { .. } => "time",
        }
    }

    /// The password hash, for every tier that carries one.
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Self::NoSecurity => None,
            Self::PasswordOnly { password_hash }
            | Self::GeoSecured { password_hash, .. }
            | Self::TimeSecured { password_hash, .. } => Some(password_hash),
        }
    }

    /// Whether any gate is enabled.
    pub fn is_secured(&self) -> bool {
        !matches!(self, Self::NoSecurity)
    }

    /// Whether the unlock flow needs a position fix for this policy.
    pub fn requires_position(&self) -> bool {
        matches!(self, Self::GeoSecured { .. })
    }
}

/// Reject empty vault passwords before hashing.
fn validate_plaintext(plaintext: &str) -> Result<()> {
    if plaintext.is_empty() {
        return Err(AccessError::InvalidInput {
            reason: "vault password must not be empty".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Password hashing boundary using PBKDF2-HMAC-SHA256 via the `ring` crate.
//!
//! Vault passwords are never stored or logged in plaintext. [`hash_password`]
//! produces a self-describing string carrying the scheme, iteration count,
//! salt, and derived key:
//!
//! ```text
//! pbkdf2-sha256$600000$<salt base64>$<key base64>
//! ```
//!
//! [`verify_password`] re-derives with the stored parameters and compares via
//! `ring::pbkdf2::verify`, which is constant-time in the derived key.
//!
//! # Security Notes
//!
//! - The iteration count is 600,000 per OWASP (2023) for HMAC-SHA256, well
//!   above the brute-force resistance of a bcrypt work factor of 12.
//! - Salts are 16 random bytes from the system CSPRNG, fresh per hash.
//! - A malformed or unrecognized stored hash verifies as `false` rather than
//!   erroring, so a corrupted record can never grant access.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{AccessError, Result};

/// Length of the random salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes.
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count — 600,000 per OWASP 2023 recommendation for
/// HMAC-SHA256.
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Scheme tag prefixed to every stored hash string.
const SCHEME: &str = "pbkdf2-sha256";

/// PBKDF2 algorithm: HMAC-SHA256.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hash a plaintext password into a salted, one-way hash string.
///
/// # Errors
///
/// Returns [`AccessError::HashingFailed`] if the system CSPRNG fails.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| AccessError::HashingFailed {
        reason: "failed to generate random salt".into(),
    })?;

    let iterations =
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero");

    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations, &salt, plaintext.as_bytes(), &mut key);

    tracing::trace!("hashed vault password");

    Ok(format!(
        "{SCHEME}${PBKDF2_ITERATIONS}${}${}",
        BASE64.encode(salt),
        BASE64.encode(key)
    ))
}

/// Verify a plaintext password against a stored hash string.
///
/// Returns `false` for a wrong password and for any stored string that does
/// not parse as a hash produced by [`hash_password`]. The underlying
/// comparison is constant-time (via `ring`).
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Some((iterations, salt, key)) = parse_hash(stored) else {
        tracing::warn!("stored password hash is malformed, denying");
        return false;
    };

    pbkdf2::verify(PBKDF2_ALG, iterations, &salt, plaintext.as_bytes(), &key).is_ok()
}

/// Split a stored hash string into `(iterations, salt, key)`.
fn parse_hash(stored: &str) -> Option<(std::num::NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = stored.split('$');
    if parts.next()? != SCHEME {
        return None;
    }

    let iterations: u32 = parts.next()?.parse().ok()?;
    let iterations = std::num::NonZeroU32::new(iterations)?;
    let salt = BASE64.decode(parts.next()?).ok()?;
    let key = BASE64.decode(parts.next()?).ok()?;

    if parts.next().is_some() || salt.is_empty() || key.is_empty() {
        return None;
    }

    Some((iterations, salt, key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

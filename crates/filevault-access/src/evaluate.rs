//! Gate evaluation: does this evidence open this vault?
//!
//! [`evaluate`] is a pure function over a policy snapshot and the evidence
//! gathered at unlock time. Gates run in a fixed order — time, then geo,
//! then password — and the first failing gate short-circuits with its reason.
//! The tagged policy model means at most one of the time/geo gates exists on
//! any given policy; the password gate runs for every secured tier.
//!
//! Missing evidence (no position fix, no password attempt) is an ordinary
//! [`DenyReason::MissingEvidence`] decision, never an error: a denied sensor
//! permission must not look different from standing outside the fence to an
//! attacker probing the vault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{Coordinates, haversine_distance_meters};
use crate::hash;
use crate::policy::VaultSecurityPolicy;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ephemeral client evidence supplied at unlock time. Never persisted.
#[derive(Debug, Clone)]
pub struct AccessEvidence {
    /// The password the client typed, if any.
    pub password_attempt: Option<String>,

    /// The client's position fix, if the sensor produced one.
    pub current_position: Option<Coordinates>,

    /// Wall-clock time of the unlock attempt (UTC).
    pub now: DateTime<Utc>,
}

impl AccessEvidence {
    /// Evidence carrying only a timestamp — enough for an unsecured vault or
    /// a pure time lock probe.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            password_attempt: None,
            current_position: None,
            now,
        }
    }
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The time lock has not opened yet.
    TimeNotReached,

    /// The position fix is outside the geofence.
    LocationOutOfRange,

    /// The password attempt did not match.
    WrongPassword,

    /// Required evidence (position fix or password attempt) was not supplied.
    MissingEvidence,
}

impl DenyReason {
    /// Convert to the string stored in the unlock audit log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeNotReached => "time_not_reached",
            Self::LocationOutOfRange => "location_out_of_range",
            Self::WrongPassword => "wrong_password",
            Self::MissingEvidence => "missing_evidence",
        }
    }

    /// Parse from the string stored in the unlock audit log.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "time_not_reached" => Some(Self::TimeNotReached),
            "location_out_of_range" => Some(Self::LocationOutOfRange),
            "wrong_password" => Some(Self::WrongPassword),
            "missing_evidence" => Some(Self::MissingEvidence),
            _ => None,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of an unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Every enabled gate passed; the vault opens.
    Allow,

    /// A gate failed; the reason says which.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Whether the vault opens.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert to the string stored in the unlock audit log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny(reason) => reason.as_str(),
        }
    }

    /// Parse from the string stored in the unlock audit log.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Self::Allow),
            other => DenyReason::parse(other).map(Self::Deny),
        }
    }
}

impl std::fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluate an unlock attempt against a vault's security policy.
///
/// Pure and deterministic given its inputs; safe to call concurrently over
/// distinct policy snapshots. Gate order is time, geo, password, with
/// short-circuit on the first failure.
pub fn evaluate(policy: &VaultSecurityPolicy, evidence: &AccessEvidence) -> AccessDecision {
    let decision = match policy {
        VaultSecurityPolicy::NoSecurity => AccessDecision::Allow,

        VaultSecurityPolicy::PasswordOnly { password_hash } => {
            password_gate(password_hash, evidence.password_attempt.as_deref())
        }

        VaultSecurityPolicy::GeoSecured {
            center,
            radius_meters,
            password_hash,
        } => match geo_gate(*center, *radius_meters, evidence.current_position) {
            AccessDecision::Allow => {
                password_gate(password_hash, evidence.password_attempt.as_deref())
            }
            deny => deny,
        },

        VaultSecurityPolicy::TimeSecured {
            unlock_at,
            password_hash,
        } => {
            if evidence.now < *unlock_at {
                AccessDecision::Deny(DenyReason::TimeNotReached)
            } else {
                password_gate(password_hash, evidence.password_attempt.as_deref())
            }
        }
    };

    tracing::debug!(
        tier = policy.tier(),
        decision = %decision,
        "unlock attempt evaluated"
    );

    decision
}

/// Geofence check: the fix must exist and lie within `radius_meters` of
/// `center`.
fn geo_gate(
    center: Coordinates,
    radius_meters: u32,
    position: Option<Coordinates>,
) -> AccessDecision {
    let Some(position) = position else {
        return AccessDecision::Deny(DenyReason::MissingEvidence);
    };

    let distance = haversine_distance_meters(position, center);
    if distance <= f64::from(radius_meters) {
        AccessDecision::Allow
    } else {
        tracing::debug!(
            distance_meters = distance,
            radius_meters = radius_meters,
            "position fix outside geofence"
        );
        AccessDecision::Deny(DenyReason::LocationOutOfRange)
    }
}

/// Password check: an attempt must exist and hash-match the stored value.
fn password_gate(password_hash: &str, attempt: Option<&str>) -> AccessDecision {
    let Some(attempt) = attempt else {
        return AccessDecision::Deny(DenyReason::MissingEvidence);
    };

    if hash::verify_password(attempt, password_hash) {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny(DenyReason::WrongPassword)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

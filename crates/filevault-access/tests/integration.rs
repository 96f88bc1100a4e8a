//! Integration tests for the filevault-access crate.
//!
//! These exercise the full access-control surface: policy mutation, gate
//! evaluation across tiers, the hashing boundary, and the geometry that
//! backs the geofence.

use chrono::{Duration, Utc};
use filevault_access::geo::{Coordinates, haversine_distance_meters};
use filevault_access::{
    AccessDecision, AccessEvidence, DenyReason, VaultSecurityPolicy, evaluate, hash,
};

/// Evidence with a password attempt, a position fix, and the current time.
fn evidence(password: &str, position: Coordinates) -> AccessEvidence {
    AccessEvidence {
        password_attempt: Some(password.to_string()),
        current_position: Some(position),
        now: Utc::now(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Policy lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn vault_starts_open_and_locks_down_tier_by_tier() {
    // Creation state: everything allowed.
    let policy = VaultSecurityPolicy::default();
    assert!(evaluate(&policy, &AccessEvidence::at(Utc::now())).is_allowed());

    // Password only.
    let policy = VaultSecurityPolicy::enable_password_only("first").unwrap();
    assert_eq!(
        evaluate(&policy, &evidence("first", Coordinates::new(0.0, 0.0))),
        AccessDecision::Allow
    );

    // Switching to a time lock re-hashes a new password.
    let unlock_at = (Utc::now() - Duration::minutes(1)).to_rfc3339();
    let policy = VaultSecurityPolicy::enable_time_with_password(&unlock_at, "second").unwrap();
    assert_eq!(
        evaluate(&policy, &evidence("first", Coordinates::new(0.0, 0.0))),
        AccessDecision::Deny(DenyReason::WrongPassword)
    );
    assert_eq!(
        evaluate(&policy, &evidence("second", Coordinates::new(0.0, 0.0))),
        AccessDecision::Allow
    );

    // Switching to a geofence drops the time lock entirely.
    let policy =
        VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 500, "third").unwrap();
    assert!(matches!(policy, VaultSecurityPolicy::GeoSecured { .. }));

    // And back to the open creation state.
    let policy = VaultSecurityPolicy::disable_security();
    assert!(evaluate(&policy, &AccessEvidence::at(Utc::now())).is_allowed());
}

#[test]
fn failed_mutation_produces_no_policy() {
    // Each invalid input errors before any policy value exists, so a caller
    // persisting only Ok results cannot corrupt the stored record.
    assert!(VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 0, "pw").is_err());
    assert!(VaultSecurityPolicy::enable_geo_with_password(f64::NAN, 0.0, 500, "pw").is_err());
    assert!(VaultSecurityPolicy::enable_time_with_password("not-a-date", "pw").is_err());
    assert!(VaultSecurityPolicy::enable_password_only("").is_err());
}

// ═══════════════════════════════════════════════════════════════════════
//  Gate behavior
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn time_lock_opens_exactly_at_unlock_instant() {
    let unlock_at = Utc::now() + Duration::hours(1);
    let policy =
        VaultSecurityPolicy::enable_time_with_password(&unlock_at.to_rfc3339(), "pw").unwrap();

    let mut ev = evidence("pw", Coordinates::new(0.0, 0.0));

    ev.now = unlock_at - Duration::seconds(1);
    assert_eq!(
        evaluate(&policy, &ev),
        AccessDecision::Deny(DenyReason::TimeNotReached)
    );

    // now >= unlock_at grants, boundary included.
    ev.now = unlock_at;
    assert_eq!(evaluate(&policy, &ev), AccessDecision::Allow);

    ev.now = unlock_at + Duration::seconds(1);
    assert_eq!(evaluate(&policy, &ev), AccessDecision::Allow);
}

#[test]
fn geofence_radius_is_inclusive() {
    let center = Coordinates::new(40.0, -73.0);
    let policy =
        VaultSecurityPolicy::enable_geo_with_password(center.lat, center.lng, 500, "pw").unwrap();

    // 0.0045° of latitude ≈ 500 m; verify the helper distance first.
    let near = Coordinates::new(40.0045, -73.0);
    let d = haversine_distance_meters(center, near);
    assert!((d - 500.0).abs() / 500.0 < 0.01, "distance was {d}");

    // Just inside and just outside the fence.
    let inside = Coordinates::new(40.0 + 499.0 / 111_195.0, -73.0);
    let outside = Coordinates::new(40.0 + 501.0 / 111_195.0, -73.0);

    assert_eq!(evaluate(&policy, &evidence("pw", inside)), AccessDecision::Allow);
    assert_eq!(
        evaluate(&policy, &evidence("pw", outside)),
        AccessDecision::Deny(DenyReason::LocationOutOfRange)
    );
}

#[test]
fn missing_evidence_is_a_deny_not_an_error() {
    let policy =
        VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 500, "pw").unwrap();

    // No position fix at all (sensor denied or timed out upstream).
    let no_fix = AccessEvidence {
        password_attempt: Some("pw".into()),
        current_position: None,
        now: Utc::now(),
    };
    assert_eq!(
        evaluate(&policy, &no_fix),
        AccessDecision::Deny(DenyReason::MissingEvidence)
    );

    // In range but the prompt was cancelled.
    let no_attempt = AccessEvidence {
        password_attempt: None,
        current_position: Some(Coordinates::new(40.0, -73.0)),
        now: Utc::now(),
    };
    assert_eq!(
        evaluate(&policy, &no_attempt),
        AccessDecision::Deny(DenyReason::MissingEvidence)
    );
}

// ═══════════════════════════════════════════════════════════════════════
//  Hashing boundary
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn hash_boundary_contract() {
    let stored = hash::hash_password("correct plaintext").unwrap();

    assert!(hash::verify_password("correct plaintext", &stored));
    assert!(!hash::verify_password("wrong plaintext", &stored));

    // The stored string never contains the plaintext.
    assert!(!stored.contains("correct plaintext"));
}

//! Evidence-gathering collaborators: position sensor, clock, and credential
//! prompt.
//!
//! Gathering evidence is latency-bound (a GPS fix, a user typing a password),
//! so the sensor and prompt traits are async; the evaluator itself never
//! suspends. The [`EvidenceCollector`] bounds how long it waits for a
//! position fix — a timed-out or unavailable sensor simply yields no fix,
//! which the evaluator reports as `Deny(MissingEvidence)`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::evaluate::AccessEvidence;
use crate::geo::Coordinates;
use crate::policy::VaultSecurityPolicy;

/// Default bound on a position fix, matching the surrounding application's
/// geolocation timeout.
pub const DEFAULT_SENSOR_TIMEOUT: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// The position sensor could not produce a fix (permission denied, no
/// hardware, no signal).
#[derive(Debug, thiserror::Error)]
#[error("position sensor unavailable: {reason}")]
pub struct SensorUnavailable {
    pub reason: String,
}

/// A source of geolocation fixes.
#[async_trait]
pub trait PositionSensor: Send + Sync {
    /// Obtain the client's current position.
    async fn current_position(&self) -> Result<Coordinates, SensorUnavailable>;
}

/// A source of wall-clock time. Abstracted so tests can freeze the clock.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Asks the user for the vault password. Owned by whatever UI surrounds the
/// core; returns `None` when the user cancels.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Prompt for the vault password.
    async fn request_password(&self) -> Option<String>;
}

// ---------------------------------------------------------------------------
// EvidenceCollector
// ---------------------------------------------------------------------------

/// Gathers exactly the evidence a policy's enabled gates need.
///
/// A vault with no geofence never touches the sensor, and an unsecured vault
/// never prompts for a password — the collector inspects the policy before
/// reaching out to any collaborator.
pub struct EvidenceCollector {
    sensor: Box<dyn PositionSensor>,
    prompt: Box<dyn CredentialPrompt>,
    clock: Box<dyn Clock>,
    sensor_timeout: Duration,
}

impl EvidenceCollector {
    /// Create a collector over the given collaborators with the default
    /// sensor timeout.
    pub fn new(
        sensor: Box<dyn PositionSensor>,
        prompt: Box<dyn CredentialPrompt>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            sensor,
            prompt,
            clock,
            sensor_timeout: DEFAULT_SENSOR_TIMEOUT,
        }
    }

    /// Override how long a position fix may take before it counts as missing.
    pub fn with_sensor_timeout(mut self, timeout: Duration) -> Self {
        self.sensor_timeout = timeout;
        self
    }

    /// Gather the evidence the given policy needs.
    ///
    /// Sensor failures, sensor timeouts, and a cancelled prompt all surface
    /// as absent evidence rather than errors.
    pub async fn collect(&self, policy: &VaultSecurityPolicy) -> AccessEvidence {
        let current_position = if policy.requires_position() {
            self.position_fix().await
        } else {
            None
        };

        let password_attempt = if policy.password_hash().is_some() {
            self.prompt.request_password().await
        } else {
            None
        };

        AccessEvidence {
            password_attempt,
            current_position,
            now: self.clock.now(),
        }
    }

    /// Read the sensor, bounded by the configured timeout.
    async fn position_fix(&self) -> Option<Coordinates> {
        match tokio::time::timeout(self.sensor_timeout, self.sensor.current_position()).await {
            Ok(Ok(position)) => Some(position),
            Ok(Err(e)) => {
                tracing::debug!(reason = %e, "position sensor unavailable");
                None
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.sensor_timeout.as_millis() as u64,
                    "position fix timed out"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

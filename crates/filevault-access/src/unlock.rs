//! High-level unlock flow.
//!
//! The [`UnlockService`] ties the pieces together for a single unlock
//! attempt: load the vault's policy from the record store, gather the
//! evidence its gates need, evaluate, record the decision. The record store
//! is behind the [`PolicyStore`] trait so the core stays independent of any
//! particular persistence engine.

use crate::error::Result;
use crate::evaluate::{AccessDecision, evaluate};
use crate::evidence::EvidenceCollector;
use crate::policy::VaultSecurityPolicy;

// ---------------------------------------------------------------------------
// PolicyStore
// ---------------------------------------------------------------------------

/// Record-store contract for vault security policies.
///
/// Storage faults must be surfaced unmodified ([`crate::AccessError::Storage`]
/// / [`crate::AccessError::VaultNotFound`]); this core does not retry writes.
pub trait PolicyStore: Send + Sync {
    /// Load the security policy attached to a vault.
    fn get_vault_policy(&self, vault_id: &str) -> Result<VaultSecurityPolicy>;

    /// Replace a vault's security policy in one atomic write.
    fn put_vault_policy(&self, vault_id: &str, policy: &VaultSecurityPolicy) -> Result<()>;

    /// Record an unlock decision in the audit log.
    fn record_unlock(&self, vault_id: &str, decision: AccessDecision) -> Result<()>;
}

// ---------------------------------------------------------------------------
// UnlockService
// ---------------------------------------------------------------------------

/// Orchestrates unlock attempts against a policy store.
pub struct UnlockService<S> {
    store: S,
    collector: EvidenceCollector,
}

impl<S: PolicyStore> UnlockService<S> {
    /// Create an unlock service over the given store and evidence collector.
    pub fn new(store: S, collector: EvidenceCollector) -> Self {
        Self { store, collector }
    }

    /// Attempt to unlock a vault.
    ///
    /// This method:
    /// 1. Loads the vault's security policy.
    /// 2. Gathers only the evidence the policy's gates need (sensor reads
    ///    are timeout-bounded; absent evidence becomes a deny, not an error).
    /// 3. Evaluates the gates.
    /// 4. Records the decision in the unlock audit log.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage faults or a missing vault; every
    /// gate outcome, including denied ones, is an `Ok` decision.
    pub async fn unlock(&self, vault_id: &str) -> Result<AccessDecision> {
        let policy = self.store.get_vault_policy(vault_id)?;

        let evidence = self.collector.collect(&policy).await;
        let decision = evaluate(&policy, &evidence);

        self.store.record_unlock(vault_id, decision)?;

        tracing::info!(
            vault_id = vault_id,
            tier = policy.tier(),
            decision = %decision,
            "vault unlock attempt"
        );

        Ok(decision)
    }

    /// Replace a vault's security policy.
    ///
    /// The policy value is built beforehand through the
    /// [`VaultSecurityPolicy`] constructors, so invalid input never reaches
    /// the store.
    pub fn configure(&self, vault_id: &str, policy: &VaultSecurityPolicy) -> Result<()> {
        self.store.put_vault_policy(vault_id, policy)
    }

    /// The underlying policy store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::AccessError;
    use crate::evaluate::DenyReason;
    use crate::evidence::{
        CredentialPrompt, PositionSensor, SensorUnavailable, SystemClock,
    };
    use crate::geo::Coordinates;

    /// In-memory store holding a single vault's policy plus its audit trail.
    struct MemoryStore {
        policy: Mutex<VaultSecurityPolicy>,
        audit: Mutex<Vec<(String, AccessDecision)>>,
    }

    impl MemoryStore {
        fn new(policy: VaultSecurityPolicy) -> Self {
            Self {
                policy: Mutex::new(policy),
                audit: Mutex::new(Vec::new()),
            }
        }
    }

    impl PolicyStore for MemoryStore {
        fn get_vault_policy(&self, vault_id: &str) -> Result<VaultSecurityPolicy> {
            if vault_id == "missing" {
                return Err(AccessError::VaultNotFound {
                    vault_id: vault_id.into(),
                });
            }
            Ok(self.policy.lock().unwrap().clone())
        }

        fn put_vault_policy(&self, _vault_id: &str, policy: &VaultSecurityPolicy) -> Result<()> {
            *self.policy.lock().unwrap() = policy.clone();
            Ok(())
        }

        fn record_unlock(&self, vault_id: &str, decision: AccessDecision) -> Result<()> {
            self.audit.lock().unwrap().push((vault_id.into(), decision));
            Ok(())
        }
    }

    struct FixedSensor(Coordinates);

    #[async_trait]
    impl PositionSensor for FixedSensor {
        async fn current_position(&self) -> std::result::Result<Coordinates, SensorUnavailable> {
            Ok(self.0)
        }
    }

    struct TypedPassword(&'static str);

    #[async_trait]
    impl CredentialPrompt for TypedPassword {
        async fn request_password(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn service(policy: VaultSecurityPolicy, position: Coordinates, password: &'static str)
    -> UnlockService<MemoryStore> {
        let collector = EvidenceCollector::new(
            Box::new(FixedSensor(position)),
            Box::new(TypedPassword(password)),
            Box::new(SystemClock),
        );
        UnlockService::new(MemoryStore::new(policy), collector)
    }

    #[tokio::test]
    async fn unlock_geo_vault_in_range() {
        let policy =
            VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 500, "pw").unwrap();
        let svc = service(policy, Coordinates::new(40.0, -73.0), "pw");

        let decision = svc.unlock("vault-1").await.unwrap();
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[tokio::test]
    async fn unlock_geo_vault_out_of_range() {
        let policy =
            VaultSecurityPolicy::enable_geo_with_password(40.0, -73.0, 500, "pw").unwrap();
        let svc = service(policy, Coordinates::new(41.0, -73.0), "pw");

        let decision = svc.unlock("vault-1").await.unwrap();
        assert_eq!(decision, AccessDecision::Deny(DenyReason::LocationOutOfRange));
    }

    #[tokio::test]
    async fn every_attempt_is_audited() {
        let policy = VaultSecurityPolicy::enable_password_only("right").unwrap();
        let svc = service(policy, Coordinates::new(0.0, 0.0), "wrong");

        svc.unlock("vault-1").await.unwrap();
        svc.unlock("vault-1").await.unwrap();

        let audit = svc.store().audit.lock().unwrap();
        assert_eq!(audit.len(), 2);
        assert!(
            audit
                .iter()
                .all(|(_, d)| *d == AccessDecision::Deny(DenyReason::WrongPassword))
        );
    }

    #[tokio::test]
    async fn missing_vault_propagates_as_error() {
        let svc = service(
            VaultSecurityPolicy::NoSecurity,
            Coordinates::new(0.0, 0.0),
            "pw",
        );

        let result = svc.unlock("missing").await;
        assert!(matches!(result, Err(AccessError::VaultNotFound { .. })));
    }

    #[tokio::test]
    async fn configure_replaces_policy() {
        let svc = service(
            VaultSecurityPolicy::NoSecurity,
            Coordinates::new(0.0, 0.0),
            "pw",
        );

        let policy = VaultSecurityPolicy::enable_password_only("pw").unwrap();
        svc.configure("vault-1", &policy).unwrap();

        assert_eq!(svc.unlock("vault-1").await.unwrap(), AccessDecision::Allow);
    }
}

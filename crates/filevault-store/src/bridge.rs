//! Bridges [`VaultStore`] to the access core's [`PolicyStore`] seam.
//!
//! `rusqlite::Connection` is `!Sync`, so the store is wrapped in a `Mutex`
//! and each operation holds the lock only for its single synchronous call.
//! Store errors cross the boundary as [`AccessError::VaultNotFound`] or
//! [`AccessError::Storage`] carrying the original error unmodified.

use std::sync::Mutex;

use filevault_access::{AccessDecision, AccessError, PolicyStore, VaultSecurityPolicy};

use crate::error::StoreError;
use crate::store::VaultStore;

/// A [`VaultStore`] shareable across async tasks, usable wherever the access
/// core expects a [`PolicyStore`].
pub struct SharedVaultStore {
    inner: Mutex<VaultStore>,
}

impl SharedVaultStore {
    /// Wrap a store for shared use.
    pub fn new(store: VaultStore) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    /// Run `f` against the underlying store while holding the lock.
    pub fn with<T>(
        &self,
        f: impl FnOnce(&VaultStore) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Internal("store mutex poisoned".into()))?;
        f(&guard)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VaultStore>, AccessError> {
        self.inner
            .lock()
            .map_err(|_| AccessError::Storage("store mutex poisoned".into()))
    }
}

/// Translate a store fault into the access core's error taxonomy.
fn to_access_error(e: StoreError) -> AccessError {
    match e {
        StoreError::VaultNotFound { vault_id } => AccessError::VaultNotFound { vault_id },
        other => AccessError::Storage(Box::new(other)),
    }
}

impl PolicyStore for SharedVaultStore {
    fn get_vault_policy(&self, vault_id: &str) -> Result<VaultSecurityPolicy, AccessError> {
        self.lock()?
            .get_vault_policy(vault_id)
            .map_err(to_access_error)
    }

    fn put_vault_policy(
        &self,
        vault_id: &str,
        policy: &VaultSecurityPolicy,
    ) -> Result<(), AccessError> {
        self.lock()?
            .put_vault_policy(vault_id, policy)
            .map_err(to_access_error)
    }

    fn record_unlock(&self, vault_id: &str, decision: AccessDecision) -> Result<(), AccessError> {
        self.lock()?
            .record_unlock(vault_id, decision)
            .map_err(to_access_error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_store_roundtrip() {
        let store = SharedVaultStore::new(VaultStore::open_in_memory().unwrap());
        let vault = store.with(|s| s.create_vault("photos", "user-1")).unwrap();

        let policy = VaultSecurityPolicy::enable_password_only("pw").unwrap();
        PolicyStore::put_vault_policy(&store, &vault.id, &policy).unwrap();

        let loaded = PolicyStore::get_vault_policy(&store, &vault.id).unwrap();
        assert_eq!(loaded, policy);
    }

    #[test]
    fn missing_vault_maps_to_access_error() {
        let store = SharedVaultStore::new(VaultStore::open_in_memory().unwrap());

        let result = PolicyStore::get_vault_policy(&store, "nope");
        assert!(matches!(result, Err(AccessError::VaultNotFound { .. })));
    }

    #[test]
    fn unlock_decisions_reach_the_log() {
        let store = SharedVaultStore::new(VaultStore::open_in_memory().unwrap());

        PolicyStore::record_unlock(&store, "vault-1", AccessDecision::Allow).unwrap();

        let log = store.with(|s| s.query_unlock_log(Some("vault-1"), 10)).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].decision, AccessDecision::Allow);
    }
}

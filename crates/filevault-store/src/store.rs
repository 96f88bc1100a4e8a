//! SQLite-backed vault record store.
//!
//! [`VaultStore`] wraps a `rusqlite::Connection` holding three tables:
//!
//! - `vaults` — vault records with the security policy embedded as flat
//!   columns (`password_enabled`, `password_hash`, `geo_enabled`, `geo_lat`,
//!   `geo_lng`, `geo_radius`, `time_enabled`, `unlock_at`).
//! - `file_info` — one row per file placed in a vault.
//! - `unlock_log` — immutable record of every unlock decision.
//!
//! The flat column shape exists only at this boundary: reads decode it into
//! the tagged [`VaultSecurityPolicy`], and a row whose columns violate the
//! policy invariants is a [`StoreError::CorruptPolicy`], never a silently
//! "repaired" policy. Writes always replace every security column in a
//! single UPDATE — there is no partial-field patch path.
//!
//! Schema migration is automatic: [`VaultStore::open`] creates or upgrades
//! the database as needed.

use chrono::{DateTime, Utc};
use filevault_access::{AccessDecision, VaultSecurityPolicy};
use filevault_access::geo::Coordinates;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A vault record: a named container of files with an attached security
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRecord {
    /// Record ID (UUIDv7).
    pub id: String,

    /// Vault display name.
    pub name: String,

    /// Owning user's ID (account authentication is external).
    pub owner: String,

    /// The vault's security policy.
    pub policy: VaultSecurityPolicy,

    /// When this vault was created.
    pub created_at: DateTime<Utc>,

    /// When this vault was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Metadata for a file placed in a vault. The file bytes themselves live in
/// external storage and are out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Record ID (UUIDv7).
    pub id: String,

    /// The vault this file belongs to.
    pub vault_id: String,

    /// Original file name.
    pub file_name: String,

    /// MIME content type (e.g. "image/png").
    pub content_type: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// When this file was added.
    pub created_at: DateTime<Utc>,
}

/// A single entry in the unlock audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockEntry {
    /// Database row ID.
    pub id: i64,

    /// The vault that was probed.
    pub vault_id: String,

    /// The decision that was reached.
    pub decision: AccessDecision,

    /// When the attempt occurred.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// VaultStore
// ---------------------------------------------------------------------------

/// Vault record store backed by SQLite.
///
/// # Example
///
/// ```rust,no_run
/// # use filevault_store::VaultStore;
/// # use filevault_access::VaultSecurityPolicy;
/// # fn example() -> filevault_store::Result<()> {
/// let store = VaultStore::open("data/filevault.db")?;
///
/// let vault = store.create_vault("holiday photos", "user-1")?;
/// let policy = VaultSecurityPolicy::enable_password_only("sesame")
///     .expect("valid password");
/// store.put_vault_policy(&vault.id, &policy)?;
/// # Ok(())
/// # }
/// ```
pub struct VaultStore {
    conn: Connection,
}

impl VaultStore {
    /// Open (or create) a store database at `path`.
    ///
    /// Runs schema migrations automatically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database cannot be opened, or
    /// [`StoreError::MigrationFailed`] if schema setup fails.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening vault store");

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;

        let store = Self { conn };
        store.run_migrations()?;

        tracing::info!("vault store ready");
        Ok(store)
    }

    /// Open an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    /// Configure SQLite pragmas for performance and safety.
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }

    /// Run database schema migrations.
    fn run_migrations(&self) -> Result<()> {
        tracing::debug!("running vault store schema migrations");

        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS vaults (
                id               TEXT PRIMARY KEY,
                name             TEXT NOT NULL,
                owner            TEXT NOT NULL,
                password_enabled INTEGER NOT NULL DEFAULT 0,
                password_hash    TEXT,
                geo_enabled      INTEGER NOT NULL DEFAULT 0,
                geo_lat          REAL,
                geo_lng          REAL,
                geo_radius       INTEGER,
                time_enabled     INTEGER NOT NULL DEFAULT 0,
                unlock_at        INTEGER,
                created_at       INTEGER NOT NULL,
                updated_at       INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_info (
                id           TEXT PRIMARY KEY,
                vault_id     TEXT NOT NULL REFERENCES vaults(id) ON DELETE CASCADE,
                file_name    TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes   INTEGER NOT NULL,
                created_at   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unlock_log (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                vault_id  TEXT NOT NULL,
                decision  TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_file_info_vault ON file_info(vault_id);
            CREATE INDEX IF NOT EXISTS idx_unlock_log_vault ON unlock_log(vault_id, timestamp);",
            )
            .map_err(|e| StoreError::MigrationFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!("vault store schema migrations complete");
        Ok(())
    }

    // -- Vault CRUD ---------------------------------------------------------

    /// Create a vault with no security enabled (the creation state).
    pub fn create_vault(&self, name: &str, owner: &str) -> Result<VaultRecord> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO vaults (id, name, owner, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, owner, now.timestamp(), now.timestamp()],
        )?;

        tracing::info!(vault_id = %id, name = name, owner = owner, "created vault");

        Ok(VaultRecord {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
            policy: VaultSecurityPolicy::NoSecurity,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieve a vault record, decoding its security policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VaultNotFound`] if no vault exists with the
    /// given ID, or [`StoreError::CorruptPolicy`] if the stored security
    /// columns are inconsistent.
    pub fn get_vault(&self, vault_id: &str) -> Result<VaultRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, owner, password_enabled, password_hash, geo_enabled,
                        geo_lat, geo_lng, geo_radius, time_enabled, unlock_at,
                        created_at, updated_at
                 FROM vaults WHERE id = ?1",
                params![vault_id],
                map_vault_row,
            )
            .optional()?;

        let row = row.ok_or_else(|| StoreError::VaultNotFound {
            vault_id: vault_id.to_string(),
        })?;

        let policy = decode_policy(&row)?;

        Ok(VaultRecord {
            id: row.id,
            name: row.name,
            owner: row.owner,
            policy,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_default(),
        })
    }

    /// Retrieve only a vault's security policy.
    pub fn get_vault_policy(&self, vault_id: &str) -> Result<VaultSecurityPolicy> {
        Ok(self.get_vault(vault_id)?.policy)
    }

    /// Replace a vault's security policy.
    ///
    /// Every security column is written in one UPDATE, so the stored row is
    /// always a complete policy — a reader can never observe a half-applied
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VaultNotFound`] if no vault exists with the
    /// given ID.
    pub fn put_vault_policy(&self, vault_id: &str, policy: &VaultSecurityPolicy) -> Result<()> {
        let cols = encode_policy(policy);
        let now = Utc::now().timestamp();

        let rows = self.conn.execute(
            "UPDATE vaults SET
                password_enabled = ?1, password_hash = ?2,
                geo_enabled = ?3, geo_lat = ?4, geo_lng = ?5, geo_radius = ?6,
                time_enabled = ?7, unlock_at = ?8,
                updated_at = ?9
             WHERE id = ?10",
            params![
                cols.password_enabled,
                cols.password_hash,
                cols.geo_enabled,
                cols.geo_lat,
                cols.geo_lng,
                cols.geo_radius,
                cols.time_enabled,
                cols.unlock_at,
                now,
                vault_id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::VaultNotFound {
                vault_id: vault_id.to_string(),
            });
        }

        tracing::info!(vault_id = vault_id, tier = policy.tier(), "replaced vault policy");
        Ok(())
    }

    /// Delete a vault and (via foreign key cascade) its file records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VaultNotFound`] if no vault exists with the
    /// given ID.
    pub fn delete_vault(&self, vault_id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM vaults WHERE id = ?1", params![vault_id])?;

        if rows == 0 {
            return Err(StoreError::VaultNotFound {
                vault_id: vault_id.to_string(),
            });
        }

        tracing::info!(vault_id = vault_id, "deleted vault");
        Ok(())
    }

    /// List all vaults belonging to an owner, ordered by name.
    pub fn list_vaults(&self, owner: &str) -> Result<Vec<VaultRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, owner, password_enabled, password_hash, geo_enabled,
                    geo_lat, geo_lng, geo_radius, time_enabled, unlock_at,
                    created_at, updated_at
             FROM vaults WHERE owner = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![owner], map_vault_row)?;

        let mut vaults = Vec::new();
        for row in rows {
            let row = row?;
            let policy = decode_policy(&row)?;
            vaults.push(VaultRecord {
                id: row.id,
                name: row.name,
                owner: row.owner,
                policy,
                created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
                updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_default(),
            });
        }

        tracing::debug!(owner = owner, count = vaults.len(), "listed vaults");
        Ok(vaults)
    }

    // -- File records -------------------------------------------------------

    /// Record a file placed in a vault.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VaultNotFound`] if the vault does not exist.
    pub fn add_file(
        &self,
        vault_id: &str,
        file_name: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> Result<FileRecord> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM vaults WHERE id = ?1)",
            params![vault_id],
            |row| row.get(0),
        )?;

        if !exists {
            return Err(StoreError::VaultNotFound {
                vault_id: vault_id.to_string(),
            });
        }

        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO file_info (id, vault_id, file_name, content_type, size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, vault_id, file_name, content_type, size_bytes, now.timestamp()],
        )?;

        tracing::info!(file_id = %id, vault_id = vault_id, file_name = file_name, "added file record");

        Ok(FileRecord {
            id,
            vault_id: vault_id.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
            created_at: now,
        })
    }

    /// List the file records in a vault, newest first.
    pub fn list_files(&self, vault_id: &str) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, vault_id, file_name, content_type, size_bytes, created_at
             FROM file_info WHERE vault_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![vault_id], |row| {
            Ok(FileRecord {
                id: row.get(0)?,
                vault_id: row.get(1)?,
                file_name: row.get(2)?,
                content_type: row.get(3)?,
                size_bytes: row.get(4)?,
                created_at: DateTime::from_timestamp(row.get::<_, i64>(5)?, 0)
                    .unwrap_or_default(),
            })
        })?;

        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(files)
    }

    /// Remove a file record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FileNotFound`] if no file record exists with
    /// the given ID.
    pub fn remove_file(&self, file_id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM file_info WHERE id = ?1", params![file_id])?;

        if rows == 0 {
            return Err(StoreError::FileNotFound {
                file_id: file_id.to_string(),
            });
        }

        tracing::info!(file_id = file_id, "removed file record");
        Ok(())
    }

    // -- Unlock audit log ---------------------------------------------------

    /// Record an unlock decision.
    pub fn record_unlock(&self, vault_id: &str, decision: AccessDecision) -> Result<()> {
        let now = Utc::now().timestamp();

        self.conn.execute(
            "INSERT INTO unlock_log (vault_id, decision, timestamp) VALUES (?1, ?2, ?3)",
            params![vault_id, decision.as_str(), now],
        )?;

        tracing::trace!(vault_id = vault_id, decision = %decision, "unlock entry recorded");
        Ok(())
    }

    /// Query the unlock log, most recent first.
    ///
    /// - `vault_id`: filter to one vault, or `None` for all.
    /// - `limit`: maximum number of entries returned.
    pub fn query_unlock_log(
        &self,
        vault_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<UnlockEntry>> {
        let sql = match vault_id {
            Some(_) => {
                "SELECT id, vault_id, decision, timestamp FROM unlock_log
                 WHERE vault_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2"
            }
            None => {
                "SELECT id, vault_id, decision, timestamp FROM unlock_log
                 ORDER BY timestamp DESC, id DESC LIMIT ?1"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;

        let entries: Vec<UnlockEntry> = if let Some(v) = vault_id {
            stmt.query_map(params![v, limit as i64], map_unlock_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit as i64], map_unlock_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Policy column codec
// ---------------------------------------------------------------------------

/// The flat security columns of a `vaults` row.
struct PolicyColumns {
    password_enabled: bool,
    password_hash: Option<String>,
    geo_enabled: bool,
    geo_lat: Option<f64>,
    geo_lng: Option<f64>,
    geo_radius: Option<i64>,
    time_enabled: bool,
    unlock_at: Option<i64>,
}

/// Lower a policy into its flat column form. Disabled tiers write NULLs so a
/// replaced policy leaves no stale fields behind.
fn encode_policy(policy: &VaultSecurityPolicy) -> PolicyColumns {
    let mut cols = PolicyColumns {
        password_enabled: false,
        password_hash: None,
        geo_enabled: false,
        geo_lat: None,
        geo_lng: None,
        geo_radius: None,
        time_enabled: false,
        unlock_at: None,
    };

    match policy {
        VaultSecurityPolicy::NoSecurity => {}
        VaultSecurityPolicy::PasswordOnly { password_hash } => {
            cols.password_enabled = true;
            cols.password_hash = Some(password_hash.clone());
        }
        VaultSecurityPolicy::GeoSecured {
            center,
            radius_meters,
            password_hash,
        } => {
            cols.geo_enabled = true;
            cols.geo_lat = Some(center.lat);
            cols.geo_lng = Some(center.lng);
            cols.geo_radius = Some(i64::from(*radius_meters));
            cols.password_enabled = true;
            cols.password_hash = Some(password_hash.clone());
        }
        VaultSecurityPolicy::TimeSecured {
            unlock_at,
            password_hash,
        } => {
            cols.time_enabled = true;
            cols.unlock_at = Some(unlock_at.timestamp());
            cols.password_enabled = true;
            cols.password_hash = Some(password_hash.clone());
        }
    }

    cols
}

/// Decode the flat columns back into a tagged policy, enforcing the policy
/// invariants. Any inconsistency rejects the row.
fn decode_policy(row: &VaultRow) -> Result<VaultSecurityPolicy> {
    let corrupt = |reason: &str| StoreError::CorruptPolicy {
        vault_id: row.id.clone(),
        reason: reason.to_string(),
    };

    if row.geo_enabled && row.time_enabled {
        return Err(corrupt("geo and time locks are both enabled"));
    }

    let password_hash = || -> Result<String> {
        if !row.password_enabled {
            return Err(corrupt("tiered lock without password_enabled"));
        }
        match row.password_hash.as_deref() {
            Some(h) if !h.is_empty() => Ok(h.to_string()),
            _ => Err(corrupt("password enabled but no hash stored")),
        }
    };

    if row.geo_enabled {
        let (Some(lat), Some(lng), Some(radius)) = (row.geo_lat, row.geo_lng, row.geo_radius)
        else {
            return Err(corrupt("geofence enabled but fields missing"));
        };
        let radius_meters =
            u32::try_from(radius).ok().filter(|r| *r > 0).ok_or_else(|| {
                corrupt("geofence radius must be a positive integer")
            })?;

        return Ok(VaultSecurityPolicy::GeoSecured {
            center: Coordinates::new(lat, lng),
            radius_meters,
            password_hash: password_hash()?,
        });
    }

    if row.time_enabled {
        let ts = row.unlock_at.ok_or_else(|| {
            corrupt("time lock enabled but unlock_at missing")
        })?;
        let unlock_at = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| corrupt("unlock_at is not a valid timestamp"))?;

        return Ok(VaultSecurityPolicy::TimeSecured {
            unlock_at,
            password_hash: password_hash()?,
        });
    }

    if row.password_enabled {
        return Ok(VaultSecurityPolicy::PasswordOnly {
            password_hash: password_hash()?,
        });
    }

    Ok(VaultSecurityPolicy::NoSecurity)
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

/// Raw `vaults` row, pre-decoding.
struct VaultRow {
    id: String,
    name: String,
    owner: String,
    password_enabled: bool,
    password_hash: Option<String>,
    geo_enabled: bool,
    geo_lat: Option<f64>,
    geo_lng: Option<f64>,
    geo_radius: Option<i64>,
    time_enabled: bool,
    unlock_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

fn map_vault_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VaultRow> {
    Ok(VaultRow {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        password_enabled: row.get(3)?,
        password_hash: row.get(4)?,
        geo_enabled: row.get(5)?,
        geo_lat: row.get(6)?,
        geo_lng: row.get(7)?,
        geo_radius: row.get(8)?,
        time_enabled: row.get(9)?,
        unlock_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn map_unlock_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UnlockEntry> {
    Ok(UnlockEntry {
        id: row.get(0)?,
        vault_id: row.get(1)?,
        decision: AccessDecision::parse(&row.get::<_, String>(2)?)
            .unwrap_or(AccessDecision::Deny(
                filevault_access::DenyReason::MissingEvidence,
            )),
        timestamp: DateTime::from_timestamp(row.get::<_, i64>(3)?, 0).unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

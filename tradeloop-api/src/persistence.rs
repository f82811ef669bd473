// SPDX-License-Identifier: Apache-2.0

//! §6/§9 optional periodic snapshots: `ENABLE_PERSISTENCE`-gated, whole-file
//! atomic-rename writes under `DATA_DIR/<tenant-id>/`, the way
//! `indexer_common::infra::ledger_state_storage` separates its read/write-lock
//! split from the on-disk format. The Cycle Cache is deliberately not part of
//! this schema — it's a derived index, cheaply rebuilt by re-running
//! discovery over the restored graph, so persisting it would just be another
//! place for it to go stale relative to the graph.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradeloop_common::{AssetId, TenantId, WalletId};
use tradeloop_graph::{Asset, GraphSnapshot, WalletState};
use tradeloop_identity::StoredApiKeyHash;
use tradeloop_registry::{Tenant, TenantConfig};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot read or write {0}")]
    Io(PathBuf, #[source] io::Error),
    #[error("cannot serialize snapshot for {0}")]
    Encode(PathBuf, #[source] serde_json::Error),
    #[error("snapshot at {0} is malformed, ignoring it")]
    Decode(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct TenantRecord {
    id: TenantId,
    name: String,
    contact_email: String,
    config: TenantConfig,
    api_key_hash: StoredApiKeyHash,
    webhook_secret: Option<String>,
}

fn tenant_dir(data_dir: &Path, tenant_id: TenantId) -> PathBuf {
    data_dir.join(tenant_id.to_string())
}

/// Serializes `value`, writes it to `path.tmp`, then renames over `path` —
/// the write is atomic from any reader's perspective, so a crash mid-write
/// never leaves a partially-written file at the real path.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let tmp_path = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::Encode(path.to_path_buf(), e))?;
    std::fs::write(&tmp_path, body).map_err(|e| PersistenceError::Io(tmp_path.clone(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| PersistenceError::Io(path.to_path_buf(), e))
}

/// Reads and deserializes `path`; a missing file is `Ok(None)`, a malformed
/// one is logged and treated as absent rather than aborting startup (§9:
/// "loaders validate and reject partial files").
fn read_optional<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistenceError> {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(error = %PersistenceError::Decode(path.to_path_buf(), e), "ignoring malformed snapshot file");
                Ok(None)
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::Io(path.to_path_buf(), e)),
    }
}

/// Writes `tenant.json`, `wallets.json`, and `assets.json` for one tenant.
pub fn save_tenant(data_dir: &Path, tenant: &Tenant, snapshot: &GraphSnapshot) -> Result<(), PersistenceError> {
    let dir = tenant_dir(data_dir, tenant.id);
    std::fs::create_dir_all(&dir).map_err(|e| PersistenceError::Io(dir.clone(), e))?;

    let record = TenantRecord {
        id: tenant.id,
        name: tenant.name.clone(),
        contact_email: tenant.contact_email.clone(),
        config: tenant.config.clone(),
        api_key_hash: tenant.api_key_hash().clone(),
        webhook_secret: tenant.webhook_secret().map(|s| s.expose_secret().to_owned()),
    };

    write_atomic(&dir.join("tenant.json"), &record)?;
    write_atomic(&dir.join("wallets.json"), &snapshot.wallets)?;
    write_atomic(&dir.join("assets.json"), &snapshot.assets)?;
    Ok(())
}

pub struct RestoredTenant {
    pub tenant: Tenant,
    pub wallets: BTreeMap<WalletId, WalletState>,
    pub assets: BTreeMap<AssetId, Asset>,
}

/// Loads one tenant's directory, if present. Any individual missing or
/// malformed file degrades to an empty graph rather than failing the whole
/// restore — a tenant with a corrupt `wallets.json` still comes back up with
/// its identity intact.
pub fn load_tenant(data_dir: &Path, tenant_id: TenantId) -> Result<Option<RestoredTenant>, PersistenceError> {
    let dir = tenant_dir(data_dir, tenant_id);
    let Some(record): Option<TenantRecord> = read_optional(&dir.join("tenant.json"))? else {
        return Ok(None);
    };

    let wallets = read_optional(&dir.join("wallets.json"))?.unwrap_or_default();
    let assets = read_optional(&dir.join("assets.json"))?.unwrap_or_default();

    let tenant = Tenant::restore(
        record.id,
        record.name,
        record.contact_email,
        record.config,
        record.api_key_hash,
        record.webhook_secret.map(SecretString::from),
    );

    Ok(Some(RestoredTenant { tenant, wallets, assets }))
}

/// Lists the tenant ids that have a snapshot directory under `data_dir`,
/// scanned at startup to know what to restore.
pub fn discover_snapshots(data_dir: &Path) -> Result<Vec<TenantId>, PersistenceError> {
    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::Io(data_dir.to_path_buf(), e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PersistenceError::Io(data_dir.to_path_buf(), e))?;
        if let Some(name) = entry.file_name().to_str() {
            if let Ok(id) = name.parse::<TenantId>() {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tradeloop_graph::{Asset, Metadata, WalletState, WantTarget};
    use tradeloop_identity::ApiKeySecret;
    use tradeloop_registry::Tenant;

    fn sample_tenant() -> (Tenant, ApiKeySecret) {
        let key = ApiKeySecret::generate();
        let tenant = Tenant::new(
            "acme".to_owned(),
            "ops@example.com".to_owned(),
            TenantConfig::default(),
            key.hash(),
            Some(SecretString::from("whsec".to_owned())),
        );
        (tenant, key)
    }

    fn sample_snapshot() -> GraphSnapshot {
        let mut wallets = BTreeMap::new();
        let mut wants = BTreeSet::new();
        wants.insert(WantTarget::Asset(AssetId::from("Y")));
        wallets.insert(
            WalletId::from("A"),
            WalletState {
                owns: BTreeSet::from([AssetId::from("X")]),
                wants,
            },
        );

        let mut assets = BTreeMap::new();
        assets.insert(
            AssetId::from("X"),
            Asset {
                id: AssetId::from("X"),
                metadata: Metadata {
                    name: "X".to_owned(),
                    symbol: "X".to_owned(),
                    image: None,
                    collection_id: None,
                },
                owner: WalletId::from("A"),
                valuation: None,
            },
        );

        GraphSnapshot {
            wallets,
            assets,
            edges: BTreeMap::new(),
        }
    }

    #[test]
    fn save_then_load_round_trips_identity_and_graph() {
        let dir = tempfile::tempdir().unwrap();
        let (tenant, key) = sample_tenant();
        let snapshot = sample_snapshot();

        save_tenant(dir.path(), &tenant, &snapshot).unwrap();

        let restored = load_tenant(dir.path(), tenant.id).unwrap().expect("tenant present");
        assert_eq!(restored.tenant.id, tenant.id);
        assert_eq!(restored.tenant.name, tenant.name);
        assert!(restored.tenant.verify_api_key(key.expose()));
        assert_eq!(restored.wallets, snapshot.wallets);
        assert_eq!(restored.assets, snapshot.assets);
    }

    #[test]
    fn discover_snapshots_lists_only_tenant_directories() {
        let dir = tempfile::tempdir().unwrap();
        let (tenant, _key) = sample_tenant();
        save_tenant(dir.path(), &tenant, &sample_snapshot()).unwrap();
        std::fs::create_dir(dir.path().join("not-a-uuid")).unwrap();

        let ids = discover_snapshots(dir.path()).unwrap();
        assert_eq!(ids, vec![tenant.id]);
    }

    #[test]
    fn malformed_wallets_file_degrades_to_empty_rather_than_failing() {
        let dir = tempfile::tempdir().unwrap();
        let (tenant, _key) = sample_tenant();
        save_tenant(dir.path(), &tenant, &sample_snapshot()).unwrap();
        std::fs::write(tenant_dir(dir.path(), tenant.id).join("wallets.json"), b"not json").unwrap();

        let restored = load_tenant(dir.path(), tenant.id).unwrap().expect("tenant present");
        assert!(restored.wallets.is_empty());
    }

    #[test]
    fn missing_directory_is_no_tenant_rather_than_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_tenant(dir.path(), TenantId::new()).unwrap().is_none());
    }
}

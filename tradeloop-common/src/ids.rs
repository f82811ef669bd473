// SPDX-License-Identifier: Apache-2.0

//! Tagged identifiers. Each is an opaque newtype so a `WalletId` can never be
//! handed where an `AssetId` is expected, per the "dynamic, loosely-typed entity
//! shapes become tagged variants" redesign note.

use derive_more::{AsRef, Display, From};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, AsRef, Serialize, Deserialize)]
        #[serde(transparent)]
        #[as_ref(str, String)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(WalletId, "Tenant-scoped identifier of a wallet participant.");
string_id!(AssetId, "Tenant-scoped globally unique identifier of an NFT.");
string_id!(CollectionId, "Identifier of an asset collection, used by collection-level wants.");

/// Identifier of a tenant, unique process-wide. Generated as a UUIDv7 so it sorts
/// by creation time, the way `uuid` is used with the `v7` feature throughout the
/// pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::str::FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier correlating a request with server logs, per §7's `requestId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotation-invariant fingerprint of a cycle, per §4.2 canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalCycleId(String);

impl CanonicalCycleId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalCycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_id_round_trips_through_json() {
        let id = WalletId::from("wallet-a");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"wallet-a\"");
        let back: WalletId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn tenant_ids_are_unique() {
        assert_ne!(TenantId::new(), TenantId::new());
    }
}

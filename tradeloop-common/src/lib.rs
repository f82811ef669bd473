// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod error;
pub mod ids;
pub mod telemetry;

pub use error::{ApiError, ErrorCode};
pub use ids::{AssetId, CanonicalCycleId, CollectionId, RequestId, TenantId, WalletId};

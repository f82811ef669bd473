// SPDX-License-Identifier: Apache-2.0

//! §4.1 Persistent Graph: per-tenant wallets, assets, and wants, with the
//! derived directed wants-edges maintained incrementally under one write lock.

mod asset;
mod graph;
mod wallet;

pub use asset::{Asset, AssetSubmission, Metadata, Valuation};
pub use graph::{DirtySet, GraphSnapshot, TenantGraph};
pub use wallet::{WalletState, WantTarget};

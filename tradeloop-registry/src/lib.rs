// SPDX-License-Identifier: Apache-2.0

//! §3 Tenant / §5 "the only process-wide shared state is the Tenant Registry
//! (read-mostly, copy-on-write map)": tenant CRUD plus the per-tenant
//! configuration every other component reads at request time.

mod config;
mod registry;
mod tenant;

pub use config::TenantConfig;
pub use registry::{RegistryError, TenantRegistry};
pub use tenant::{Tenant, TenantSettings};

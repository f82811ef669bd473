// SPDX-License-Identifier: Apache-2.0

//! §6 `Authorization: Bearer <apiKey>` extraction. Two extractors: one resolves
//! a tenant API key against the registry, the other constant-time-compares
//! against the single admin key — the same boundary check §5 calls out as
//! the one place cross-tenant access could leak in.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tradeloop_common::{ApiError, TenantId};
use tradeloop_registry::TenantConfig;

use crate::{error_response::ApiErrorResponse, state::AppState};

fn bearer_token(parts: &Parts) -> Result<&str, ApiErrorResponse> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiErrorResponse::new(ApiError::Unauthorized))
}

/// An authenticated tenant, resolved by API key against the registry.
pub struct AuthenticatedTenant {
    pub tenant_id: TenantId,
    pub config: TenantConfig,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedTenant {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let tenant = state
            .registry
            .authenticate(token)
            .ok_or_else(|| ApiErrorResponse::new(ApiError::Unauthorized))?;
        let tenant = tenant.read();

        Ok(AuthenticatedTenant {
            tenant_id: tenant.id,
            config: tenant.config.clone(),
        })
    }
}

/// Proof the caller presented the admin key; carries no data of its own.
pub struct AdminCaller;

impl FromRequestParts<Arc<AppState>> for AdminCaller {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let admin_key = secrecy::ExposeSecret::expose_secret(&state.admin_api_key);
        let matches: bool = token.as_bytes().ct_eq(admin_key.as_bytes()).into();

        if matches {
            Ok(AdminCaller)
        } else {
            Err(ApiErrorResponse::new(ApiError::Forbidden))
        }
    }
}

//! Authentication extractors.
//!
//! Session handling lives upstream in the platform's auth service; the
//! ledger runs on the private network and receives already-authenticated
//! subjects. Two extractors cover the two surfaces:
//!
//! - `AuthUser` - an account holder, bearer token `account:<uuid>`
//! - `AdminAuth` - an administrator, bearer token `admin:<uuid>` plus the
//!   shared `x-admin-key` when one is configured

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use nocta_core::{AccountId, AdminId};

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)
}

/// An authenticated account holder.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account ID of the authenticated subject.
    pub account_id: AccountId,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let account_id = token
            .strip_prefix("account:")
            .and_then(|s| s.parse::<AccountId>().ok())
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { account_id })
    }
}

/// An authenticated administrator. Every privileged operation carries this
/// actor id into the audit trail.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// The administrator ID.
    pub admin_id: AdminId,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let admin_id = token
            .strip_prefix("admin:")
            .and_then(|s| s.parse::<AdminId>().ok())
            .ok_or(ApiError::Unauthorized)?;

        // When a shared admin key is configured, require it on top of the
        // forwarded identity.
        if let Some(expected) = &state.config.admin_api_key {
            let provided = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Forbidden)?;
            if !constant_time_eq(provided, expected) {
                return Err(ApiError::Forbidden);
            }
        }

        Ok(Self { admin_id })
    }
}

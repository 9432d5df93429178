//! Payout request and listing handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use nocta_core::{Payout, PayoutMethod, PayoutStatus};
use nocta_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Payout request body.
#[derive(Debug, Deserialize)]
pub struct RequestPayoutBody {
    /// Amount in credits.
    pub amount: u64,
    /// Delivery method.
    pub method: PayoutMethod,
    /// Method-specific destination details.
    pub details: String,
}

/// Payout response.
#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    /// Payout ID.
    pub id: String,
    /// Amount in credits.
    pub amount: u64,
    /// Current state.
    pub status: PayoutStatus,
    /// Delivery method.
    pub method: PayoutMethod,
    /// Destination details.
    pub details: String,
    /// Failure reason, when failed.
    pub failure_reason: Option<String>,
    /// When the request was created.
    pub created_at: String,
    /// When the ledger debit was recorded.
    pub processed_at: Option<String>,
}

impl From<&Payout> for PayoutResponse {
    fn from(payout: &Payout) -> Self {
        Self {
            id: payout.id.to_string(),
            amount: payout.amount,
            status: payout.status,
            method: payout.method,
            details: payout.details.clone(),
            failure_reason: payout.failure_reason.clone(),
            created_at: payout.created_at.to_rfc3339(),
            processed_at: payout.processed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Request a payout. Funds are reserved, not debited; the ledger is only
/// debited when an admin completes the payout.
pub async fn request_payout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RequestPayoutBody>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout = state
        .payouts
        .request(auth.account_id, body.amount, body.method, &body.details)?;

    Ok(Json(PayoutResponse::from(&payout)))
}

/// Payout list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListPayoutsQuery {
    /// Maximum number of payouts to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// List payouts response.
#[derive(Debug, Serialize)]
pub struct ListPayoutsResponse {
    /// Payouts (newest first).
    pub payouts: Vec<PayoutResponse>,
    /// Whether there are more payouts.
    pub has_more: bool,
}

/// List the authenticated account's payouts, newest first.
pub async fn list_payouts(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListPayoutsQuery>,
) -> Result<Json<ListPayoutsResponse>, ApiError> {
    state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let limit = query.limit.min(100);
    let payouts = state
        .store
        .list_payouts(&auth.account_id, limit + 1, query.offset)?;

    let has_more = payouts.len() > limit;
    let payouts: Vec<_> = payouts
        .iter()
        .take(limit)
        .map(PayoutResponse::from)
        .collect();

    Ok(Json(ListPayoutsResponse { payouts, has_more }))
}

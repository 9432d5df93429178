//! Admin surface: adjustments, refunds, payout transitions, audit trail.
//!
//! Every handler requires an authenticated admin; the actor id flows into
//! the audit trail through the ledger layer.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use nocta_core::{
    AccountId, AdminAction, AdminActionKind, AdminId, EntryDirection, PayoutId, TransactionId,
};

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::handlers::payouts::PayoutResponse;
use crate::state::AppState;

/// Admin adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// The account to adjust.
    pub account_id: AccountId,
    /// Amount in credits.
    pub amount: u64,
    /// Credit or debit.
    pub direction: EntryDirection,
    /// Mandatory reason.
    pub reason: String,
}

/// Admin adjustment response.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The recorded transaction.
    pub transaction_id: String,
}

/// Apply a privileged balance correction.
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    let transaction = state.processor.admin_adjustment(
        body.account_id,
        body.amount,
        body.direction,
        &body.reason,
        admin.admin_id,
    )?;

    Ok(Json(AdjustResponse {
        transaction_id: transaction.id.to_string(),
    }))
}

/// Refund request.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    /// The transaction to refund.
    pub transaction_id: TransactionId,
    /// Mandatory reason, recorded in the audit trail.
    pub reason: String,
}

/// Refund response.
#[derive(Debug, Serialize)]
pub struct RefundResponse {
    /// The refund transaction.
    pub refund_transaction_id: String,
}

/// Refund a completed transaction. Idempotent; a repeat reports
/// `already_refunded`.
pub async fn refund(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<RefundRequest>,
) -> Result<Json<RefundResponse>, ApiError> {
    if body.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("a reason is required".into()));
    }

    let refund = state.processor.refund(&body.transaction_id)?;
    state.audit.record(
        admin.admin_id,
        nocta_core::AdminActionKind::RefundIssued,
        body.transaction_id.to_string(),
        Some(body.reason),
        Some(format!("refund transaction {}", refund.id)),
    )?;

    Ok(Json(RefundResponse {
        refund_transaction_id: refund.id.to_string(),
    }))
}

fn parse_payout_id(id: &str) -> Result<PayoutId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest("Invalid payout ID".into()))
}

/// Approve a pending payout.
pub async fn approve_payout(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout_id = parse_payout_id(&id)?;
    let payout = state.payouts.approve(&payout_id, admin.admin_id)?;
    Ok(Json(PayoutResponse::from(&payout)))
}

/// Complete a processing payout, debiting the ledger.
pub async fn complete_payout(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout_id = parse_payout_id(&id)?;
    let payout = state.payouts.complete(&payout_id, admin.admin_id)?;
    Ok(Json(PayoutResponse::from(&payout)))
}

/// Fail request body.
#[derive(Debug, Deserialize)]
pub struct FailPayoutRequest {
    /// Mandatory reason.
    pub reason: String,
}

/// Fail a pending or processing payout.
pub async fn fail_payout(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<FailPayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout_id = parse_payout_id(&id)?;
    let payout = state
        .payouts
        .fail(&payout_id, admin.admin_id, &body.reason)?;
    Ok(Json(PayoutResponse::from(&payout)))
}

/// Audit trail query parameters. Exactly one of `target_id` / `actor_id`
/// selects the listing.
#[derive(Debug, Deserialize)]
pub struct ListActionsQuery {
    /// List actions recorded against this target.
    pub target_id: Option<String>,
    /// List actions recorded by this actor.
    pub actor_id: Option<AdminId>,
    /// Maximum number of entries (default: 50, max: 200).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Audit entry response.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Entry ID.
    pub id: String,
    /// Acting administrator.
    pub actor_id: String,
    /// What was done.
    pub action: AdminActionKind,
    /// What it was done to.
    pub target_id: String,
    /// Why.
    pub reason: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
    /// When.
    pub created_at: String,
}

impl From<&AdminAction> for ActionResponse {
    fn from(action: &AdminAction) -> Self {
        Self {
            id: action.id.to_string(),
            actor_id: action.actor_id.to_string(),
            action: action.action,
            target_id: action.target_id.clone(),
            reason: action.reason.clone(),
            notes: action.notes.clone(),
            created_at: action.created_at.to_rfc3339(),
        }
    }
}

/// List audit trail entries, newest first.
pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Query(query): Query<ListActionsQuery>,
) -> Result<Json<Vec<ActionResponse>>, ApiError> {
    let limit = query.limit.min(200);

    let actions = match (&query.target_id, &query.actor_id) {
        (Some(target_id), None) => state.audit.for_target(target_id, limit, query.offset)?,
        (None, Some(actor_id)) => state.audit.by_actor(actor_id, limit, query.offset)?,
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of target_id or actor_id is required".into(),
            ))
        }
    };

    Ok(Json(actions.iter().map(ActionResponse::from).collect()))
}

//! Dashboard summary handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use nocta_core::{ClubCreditSummary, EarningsSummary};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Credit overview for a club dashboard.
pub async fn club_summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ClubCreditSummary>, ApiError> {
    let summary = state.summaries.club_credit_summary(&auth.account_id)?;
    Ok(Json(summary))
}

/// Earnings breakdown for a creator dashboard.
pub async fn earnings_summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<EarningsSummary>, ApiError> {
    let summary = state.summaries.earnings_summary(&auth.account_id)?;
    Ok(Json(summary))
}

//! Account registration and lookup handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use nocta_core::{Account, AccountKind};
use nocta_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account creation request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account kind; defaults to a user account.
    #[serde(default = "default_kind")]
    pub kind: AccountKind,
}

fn default_kind() -> AccountKind {
    AccountKind::User
}

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: String,
    /// Account kind.
    pub kind: AccountKind,
    /// Current balance.
    pub balance: u64,
    /// Lifetime credits purchased.
    pub total_purchased: u64,
    /// Lifetime credits spent.
    pub total_spent: u64,
    /// When the last purchase was confirmed.
    pub last_purchase_at: Option<String>,
    /// When the account was created.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            kind: account.kind,
            balance: account.balance,
            total_purchased: account.total_purchased,
            total_spent: account.total_spent,
            last_purchase_at: account.last_purchase_at.map(|t| t.to_rfc3339()),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Register the authenticated subject's ledger account. Idempotent: an
/// existing account is returned as-is.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if let Some(existing) = state.store.get_account(&auth.account_id)? {
        return Ok(Json(AccountResponse::from(&existing)));
    }

    let account = Account::new(auth.account_id, body.kind);
    state.store.put_account(&account)?;

    tracing::info!(account_id = %account.id, kind = ?account.kind, "Account created");
    Ok(Json(AccountResponse::from(&account)))
}

/// Get the authenticated subject's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

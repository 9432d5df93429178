//! Credit balance, history, purchase, spend and transfer handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use nocta_core::{
    AccountId, CreditPackage, CreditTransaction, EarningSource, EntryDirection, TransactionKind,
    TransactionStatus,
};
use nocta_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance in credits.
    pub balance: u64,
    /// Lifetime credits purchased.
    pub total_purchased: u64,
    /// Lifetime credits spent.
    pub total_spent: u64,
    /// When the last purchase was confirmed.
    pub last_purchase_at: Option<String>,
}

/// Get the current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let snapshot = account.snapshot();
    Ok(Json(BalanceResponse {
        balance: snapshot.balance,
        total_purchased: snapshot.total_purchased,
        total_spent: snapshot.total_spent,
        last_purchase_at: snapshot.last_purchase_at.map(|t| t.to_rfc3339()),
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Kind of entry.
    pub kind: TransactionKind,
    /// Credit or debit.
    pub direction: EntryDirection,
    /// Amount in credits.
    pub amount: u64,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Earning source tag, if any.
    pub source: Option<EarningSource>,
    /// Package bought, for purchases.
    pub package_id: Option<String>,
    /// Linked entry (refund original, opposite transfer leg).
    pub linked_tx: Option<String>,
    /// Description.
    pub description: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind,
            direction: tx.direction,
            amount: tx.amount,
            status: tx.status,
            source: tx.source,
            package_id: tx.package_id.clone(),
            linked_tx: tx.linked_tx.map(|id| id.to_string()),
            description: tx.description.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more.
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions(&auth.account_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Package response.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    /// Catalog ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Credits granted.
    pub credits_amount: u64,
    /// Price in euro cents.
    pub price_cents: u64,
    /// Storefront highlight.
    pub featured: bool,
}

impl From<&CreditPackage> for PackageResponse {
    fn from(package: &CreditPackage) -> Self {
        Self {
            id: package.id.clone(),
            name: package.name.clone(),
            credits_amount: package.credits_amount,
            price_cents: package.price_cents,
            featured: package.featured,
        }
    }
}

/// List purchasable credit packages.
pub async fn list_packages(State(state): State<Arc<AppState>>) -> Json<Vec<PackageResponse>> {
    let packages = state
        .processor
        .catalog()
        .active()
        .map(PackageResponse::from)
        .collect();
    Json(packages)
}

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Catalog package to buy.
    pub package_id: String,
}

/// Purchase response: a pending transaction awaiting gateway confirmation.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// The pending transaction.
    pub transaction_id: String,
    /// Gateway payment reference.
    pub payment_ref: String,
    /// Credits granted on confirmation.
    pub credits_amount: u64,
    /// Price charged in euro cents.
    pub price_cents: u64,
}

/// Initiate a credit purchase through the payment gateway.
pub async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let intent = state
        .processor
        .purchase(auth.account_id, &body.package_id)
        .await?;

    Ok(Json(PurchaseResponse {
        transaction_id: intent.transaction_id.to_string(),
        payment_ref: intent.payment_ref,
        credits_amount: intent.credits_amount,
        price_cents: intent.price_cents,
    }))
}

/// Spend request.
#[derive(Debug, Deserialize)]
pub struct SpendRequest {
    /// Amount in credits.
    pub amount: u64,
    /// What the credits are spent on.
    pub description: String,
}

/// Spend response.
#[derive(Debug, Serialize)]
pub struct SpendResponse {
    /// The recorded transaction.
    pub transaction_id: String,
    /// Balance after the spend.
    pub balance: u64,
}

/// Spend credits.
pub async fn spend_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SpendRequest>,
) -> Result<Json<SpendResponse>, ApiError> {
    let transaction = state
        .processor
        .spend(auth.account_id, body.amount, &body.description)?;

    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(SpendResponse {
        transaction_id: transaction.id.to_string(),
        balance: account.balance,
    }))
}

/// Transfer request.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Receiving account.
    pub to: AccountId,
    /// Amount in credits.
    pub amount: u64,
    /// Earning source tag carried by the receiving leg.
    pub source: Option<EarningSource>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Transfer response.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// The sending leg.
    pub out_transaction_id: String,
    /// The receiving leg.
    pub in_transaction_id: String,
}

/// Transfer credits to another account as one atomic unit.
pub async fn transfer_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let description = body.description.unwrap_or_else(|| "transfer".into());
    let (out_leg, in_leg) = state.processor.transfer(
        auth.account_id,
        body.to,
        body.amount,
        body.source,
        &description,
    )?;

    Ok(Json(TransferResponse {
        out_transaction_id: out_leg.id.to_string(),
        in_transaction_id: in_leg.id.to_string(),
    }))
}

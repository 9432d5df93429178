//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, admin, credits, health, payouts, summaries, webhooks};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/credits/packages` - Credit package catalog
///
/// ## Account holders (bearer auth)
/// - `POST /v1/accounts` - Register ledger account
/// - `GET /v1/accounts/me` - Get own account
/// - `GET /v1/credits/balance` - Current balance snapshot
/// - `GET /v1/credits/transactions` - Transaction history
/// - `POST /v1/credits/purchase` - Initiate credit purchase
/// - `POST /v1/credits/spend` - Spend credits
/// - `POST /v1/credits/transfer` - Transfer credits
/// - `POST /v1/payouts` - Request payout
/// - `GET /v1/payouts` - List own payouts
/// - `GET /v1/summary/club` - Club credit summary
/// - `GET /v1/summary/earnings` - Earnings summary
///
/// ## Admin surface (admin bearer auth)
/// - `POST /v1/admin/adjust` - Balance adjustment
/// - `POST /v1/admin/refunds` - Refund a transaction
/// - `POST /v1/admin/payouts/:id/approve` - Approve payout
/// - `POST /v1/admin/payouts/:id/complete` - Complete payout
/// - `POST /v1/admin/payouts/:id/fail` - Fail payout
/// - `GET /v1/admin/actions` - Audit trail
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/payments` - Payment gateway callbacks
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Accounts
        .route("/v1/accounts", post(accounts::create_account))
        .route("/v1/accounts/me", get(accounts::get_account))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        .route("/v1/credits/transactions", get(credits::list_transactions))
        .route("/v1/credits/packages", get(credits::list_packages))
        .route("/v1/credits/purchase", post(credits::purchase_credits))
        .route("/v1/credits/spend", post(credits::spend_credits))
        .route("/v1/credits/transfer", post(credits::transfer_credits))
        // Payouts
        .route("/v1/payouts", post(payouts::request_payout))
        .route("/v1/payouts", get(payouts::list_payouts))
        // Summaries
        .route("/v1/summary/club", get(summaries::club_summary))
        .route("/v1/summary/earnings", get(summaries::earnings_summary))
        // Admin surface
        .route("/v1/admin/adjust", post(admin::adjust))
        .route("/v1/admin/refunds", post(admin::refund))
        .route("/v1/admin/payouts/:id/approve", post(admin::approve_payout))
        .route(
            "/v1/admin/payouts/:id/complete",
            post(admin::complete_payout),
        )
        .route("/v1/admin/payouts/:id/fail", post(admin::fail_payout))
        .route("/v1/admin/actions", get(admin::list_actions))
        // Webhooks
        .route("/webhooks/payments", post(webhooks::payment_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

//! Payout workflow and summary integration tests.

mod common;

use common::{TestHarness, ADMIN_KEY};
use serde_json::json;

async fn request_payout(harness: &TestHarness, amount: u64) -> String {
    let response = harness
        .server
        .post("/v1/payouts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": amount,
            "method": "bank_transfer",
            "details": "DE89 3704 0044 0532 0130 00"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Request
// ============================================================================

#[tokio::test]
async fn request_reserves_without_debiting() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 500).await;

    request_payout(&harness, 200).await;

    // Balance unchanged, but withdrawable shrank.
    assert_eq!(harness.balance().await, 500);

    let response = harness
        .server
        .get("/v1/summary/club")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["pending_withdrawals"], 200);
    assert_eq!(body["available_for_withdrawal"], 300);
}

#[tokio::test]
async fn requests_cannot_jointly_exceed_balance() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 300).await;

    request_payout(&harness, 200).await;

    let response = harness
        .server
        .post("/v1/payouts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 150,
            "method": "bank_transfer",
            "details": "iban"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn request_requires_details() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 300).await;

    let response = harness
        .server
        .post("/v1/payouts")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 100,
            "method": "paypal",
            "details": "  "
        }))
        .await;

    response.assert_status_bad_request();
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[tokio::test]
async fn spend_request_approve_complete_walkthrough() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 500).await;

    // Spend 250.
    harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "amount": 250, "description": "promo" }))
        .await
        .assert_status_ok();
    assert_eq!(harness.balance().await, 250);

    // Request 200 of the remaining 250.
    let payout_id = request_payout(&harness, 200).await;

    // Approve.
    let response = harness
        .server
        .post(&format!("/v1/admin/payouts/{payout_id}/approve"))
        .add_header("authorization", harness.admin_auth_header())
        .add_header("x-admin-key", ADMIN_KEY)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "processing");

    // Complete: ledger debited, processed_at set.
    let response = harness
        .server
        .post(&format!("/v1/admin/payouts/{payout_id}/complete"))
        .add_header("authorization", harness.admin_auth_header())
        .add_header("x-admin-key", ADMIN_KEY)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "completed");
    assert!(body["processed_at"].is_string());

    assert_eq!(harness.balance().await, 50);

    // The payout debit appears in the transaction history.
    let response = harness
        .server
        .get("/v1/credits/transactions?limit=1")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"][0]["kind"], "payout");
}

#[tokio::test]
async fn approve_after_racing_spend_is_stale() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 100).await;

    let payout_id = request_payout(&harness, 100).await;

    // A spend commits before approval.
    harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "amount": 50, "description": "boost" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&format!("/v1/admin/payouts/{payout_id}/approve"))
        .add_header("authorization", harness.admin_auth_header())
        .add_header("x-admin-key", ADMIN_KEY)
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "stale_balance");
    assert_eq!(body["error"]["details"]["available"], 50);
}

#[tokio::test]
async fn fail_requires_reason_and_releases_reservation() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 300).await;

    let payout_id = request_payout(&harness, 300).await;

    let response = harness
        .server
        .post(&format!("/v1/admin/payouts/{payout_id}/fail"))
        .add_header("authorization", harness.admin_auth_header())
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "reason": "" }))
        .await;
    response.assert_status_bad_request();

    let response = harness
        .server
        .post(&format!("/v1/admin/payouts/{payout_id}/fail"))
        .add_header("authorization", harness.admin_auth_header())
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "reason": "bank details rejected" }))
        .await;
    response.assert_status_ok();

    // Reservation released; the full balance is requestable again.
    request_payout(&harness, 300).await;
}

#[tokio::test]
async fn payout_list_shows_newest_first() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 500).await;

    request_payout(&harness, 100).await;
    request_payout(&harness, 150).await;

    let response = harness
        .server
        .get("/v1/payouts")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let payouts = body["payouts"].as_array().unwrap();
    assert_eq!(payouts.len(), 2);
    assert_eq!(payouts[0]["amount"], 150);
    assert_eq!(payouts[1]["amount"], 100);
}

// ============================================================================
// Summaries
// ============================================================================

#[tokio::test]
async fn earnings_summary_reflects_payouts() {
    let harness = TestHarness::new();
    harness.create_account().await;
    harness.fund(harness.account_id, 400).await;

    let payout_id = request_payout(&harness, 150).await;
    for step in ["approve", "complete"] {
        harness
            .server
            .post(&format!("/v1/admin/payouts/{payout_id}/{step}"))
            .add_header("authorization", harness.admin_auth_header())
            .add_header("x-admin-key", ADMIN_KEY)
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/summary/earnings")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["credits_payouts"], 150);
    assert_eq!(body["credits_available"], 250);
    assert!(body["last_payout_at"].is_string());
}

//! Common test utilities for nocta-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use nocta_core::{AccountId, AdminId};
use nocta_ledger::{GatewayError, PaymentGateway, PaymentRequest};
use nocta_service::{create_router, crypto, AppState, ServiceConfig};
use nocta_store::RocksStore;

/// Webhook signing secret used by the test config.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Shared admin key used by the test config.
pub const ADMIN_KEY: &str = "test-admin-key";

/// In-process payment gateway issuing predictable payment references.
pub struct StubGateway {
    counter: AtomicU64,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn validate_amount(&self, amount_cents: u64) -> Result<(), GatewayError> {
        if amount_cents == 0 {
            return Err(GatewayError::Rejected("zero amount".into()));
        }
        Ok(())
    }

    async fn initiate_payment(&self, _request: &PaymentRequest) -> Result<String, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("pay_test_{n}"))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test account ID for authenticated requests.
    pub account_id: AccountId,
    /// A test admin ID for privileged requests.
    pub admin_id: AdminId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            gateway_api_url: None,
            gateway_api_key: None,
            gateway_webhook_secret: Some(WEBHOOK_SECRET.into()),
            admin_api_key: Some(ADMIN_KEY.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::with_gateway(Arc::new(store), config, Arc::new(StubGateway::new()));
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            account_id: AccountId::generate(),
            admin_id: AdminId::generate(),
        }
    }

    /// Authorization header for the harness's default account.
    pub fn user_auth_header(&self) -> String {
        Self::auth_header_for(self.account_id)
    }

    /// Authorization header for an arbitrary account.
    pub fn auth_header_for(account_id: AccountId) -> String {
        format!("Bearer account:{account_id}")
    }

    /// Authorization header for the harness's admin.
    pub fn admin_auth_header(&self) -> String {
        format!("Bearer admin:{}", self.admin_id)
    }

    /// Register the default account.
    pub async fn create_account(&self) {
        self.create_account_as(self.account_id, "user").await;
    }

    /// Register an account of the given kind.
    pub async fn create_account_as(&self, account_id: AccountId, kind: &str) {
        self.server
            .post("/v1/accounts")
            .add_header("authorization", Self::auth_header_for(account_id))
            .json(&json!({ "kind": kind }))
            .await
            .assert_status_ok();
    }

    /// Grant credits through the admin adjustment endpoint.
    pub async fn fund(&self, account_id: AccountId, amount: u64) {
        self.server
            .post("/v1/admin/adjust")
            .add_header("authorization", self.admin_auth_header())
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "account_id": account_id.to_string(),
                "amount": amount,
                "direction": "credit",
                "reason": "test funding"
            }))
            .await
            .assert_status_ok();
    }

    /// Read the default account's balance.
    pub async fn balance(&self) -> u64 {
        let response = self
            .server
            .get("/v1/credits/balance")
            .add_header("authorization", self.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["balance"].as_u64().unwrap()
    }

    /// Sign a webhook body the way the gateway would.
    pub fn sign_webhook(body: &str) -> String {
        crypto::hmac_sha256_hex(WEBHOOK_SECRET, body)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

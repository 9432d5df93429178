//! API error types and responses.
//!
//! Every error renders as `{"error": {"code", "message", "details?"}}`.
//! Transient conditions (`busy`) are distinguished from permanent ones
//! (`insufficient_credits`) so dashboards know whether a retry can help.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use nocta_ledger::LedgerError;
use nocta_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - idempotency guard or invalid state transition.
    #[error("conflict: {message}")]
    Conflict {
        /// Stable machine-readable code.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Insufficient credits. Permanent; the user must top up.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: u64,
        /// Required amount.
        required: u64,
    },

    /// The balance no longer covers a payout that was admissible when
    /// requested.
    #[error("stale balance: available={available}, requested={requested}")]
    StaleBalance {
        /// Credits currently available.
        available: u64,
        /// The payout amount.
        requested: u64,
    },

    /// Transient contention; safe to retry with backoff.
    #[error("ledger busy")]
    Busy,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, *code, message.clone(), None),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::StaleBalance {
                available,
                requested,
            } => (
                StatusCode::CONFLICT,
                "stale_balance",
                self.to_string(),
                Some(serde_json::json!({
                    "available": available,
                    "requested": requested
                })),
            ),
            Self::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "busy",
                "The account is busy, retry shortly".to_string(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => Self::BadRequest(msg),
            LedgerError::NotFound(msg) => Self::NotFound(msg),
            LedgerError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            LedgerError::StaleBalance {
                available,
                requested,
            } => Self::StaleBalance {
                available,
                requested,
            },
            LedgerError::AlreadyRefunded { transaction_id } => Self::Conflict {
                code: "already_refunded",
                message: format!("Transaction {transaction_id} was already refunded"),
            },
            LedgerError::AlreadyProcessed { id } => Self::Conflict {
                code: "already_processed",
                message: format!("{id} was already processed"),
            },
            LedgerError::InvalidTransition { from, to } => Self::Conflict {
                code: "invalid_transition",
                message: format!("Cannot move from {from} to {to}"),
            },
            LedgerError::Busy => Self::Busy,
            LedgerError::Integrity(msg) => {
                tracing::error!(error = %msg, "LEDGER INTEGRITY VIOLATION");
                Self::Internal(msg)
            }
            LedgerError::Gateway(msg) => Self::ExternalService(msg),
            LedgerError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        LedgerError::from(err).into()
    }
}

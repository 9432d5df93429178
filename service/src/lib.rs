//! HTTP API service for the Nocta credit ledger.
//!
//! Exposes the ledger to its consumers: account-holder dashboards
//! (balances, spending, transfers, payout requests, summaries), the admin
//! surface (adjustments, refunds, payout transitions, audit trail) and the
//! payment gateway's webhook callbacks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use gateway::{DisabledGateway, HttpPaymentGateway};
pub use routes::create_router;
pub use state::AppState;

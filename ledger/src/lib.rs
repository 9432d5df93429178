//! Business layer of the Nocta credit ledger.
//!
//! Sits between the HTTP surface and the storage layer:
//!
//! - [`TransactionProcessor`]: purchase lifecycle (gateway round-trip,
//!   webhook settlement), spends, transfers, refunds, admin adjustments.
//! - [`PayoutWorkflow`]: the admin-mediated payout state machine.
//! - [`SummaryAggregator`]: read-only dashboard projections.
//! - [`AuditTrail`]: append-only record of privileged actions.
//! - [`PaymentGateway`]: the external payment collaborator contract.
//!
//! All components are generic over [`nocta_store::Store`]; atomicity and
//! per-account serialization live in the store, validation and
//! orchestration live here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod error;
pub mod gateway;
pub mod payout;
pub mod processor;
pub mod summary;

pub use audit::AuditTrail;
pub use error::{LedgerError, Result};
pub use gateway::{GatewayError, PaymentGateway, PaymentRequest};
pub use payout::PayoutWorkflow;
pub use processor::{PurchaseIntent, TransactionProcessor};
pub use summary::SummaryAggregator;

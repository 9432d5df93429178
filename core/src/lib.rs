//! Core types for the Nocta credit ledger.
//!
//! This crate provides the foundational types used throughout the ledger:
//!
//! - **Identifiers**: `AccountId`, `AdminId`, `TransactionId`, `PayoutId`, `ActionId`
//! - **Accounts**: `Account`, `AccountKind`, `BalanceSnapshot`
//! - **Transactions**: `CreditTransaction`, `TransactionKind`, `TransactionStatus`
//! - **Payouts**: `Payout`, `PayoutStatus`, `PayoutMethod`
//! - **Packages**: `CreditPackage`, `PackageCatalog`
//! - **Audit**: `AdminAction`, `AdminActionKind`
//! - **Summaries**: `ClubCreditSummary`, `EarningsSummary`
//!
//! # Credits
//!
//! **1 credit** is the platform's internal currency unit. Amounts are stored
//! as `u64`: a negative balance is unrepresentable, and every debit is
//! validated with checked arithmetic before it is committed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod audit;
pub mod ids;
pub mod package;
pub mod payout;
pub mod summary;
pub mod transaction;

pub use account::{Account, AccountKind, BalanceSnapshot};
pub use audit::{AdminAction, AdminActionKind};
pub use ids::{AccountId, ActionId, AdminId, IdError, PayoutId, TransactionId};
pub use package::{CreditPackage, PackageCatalog};
pub use payout::{Payout, PayoutMethod, PayoutStatus};
pub use summary::{ClubCreditSummary, EarningsSummary};
pub use transaction::{
    CreditTransaction, EarningSource, EntryDirection, TransactionKind, TransactionStatus,
};

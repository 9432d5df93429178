//! Key encoding utilities for `RocksDB`.
//!
//! Primary keys are raw id bytes. Per-account index keys concatenate the
//! 16-byte account UUID with the 16-byte record ULID, so iteration order
//! within an account prefix is creation order.

use nocta_core::{AccountId, ActionId, AdminId, PayoutId, TransactionId};

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create an account-transaction index key.
///
/// Format: `account_id (16 bytes) || transaction_id (16 bytes)`
#[must_use]
pub fn account_transaction_key(account_id: &AccountId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Prefix for iterating all transactions of an account.
#[must_use]
pub fn account_transactions_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Extract the transaction ID from an account-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a payment reference key.
#[must_use]
pub fn payment_ref_key(payment_ref: &str) -> Vec<u8> {
    payment_ref.as_bytes().to_vec()
}

/// Create a payout key from a payout ID.
#[must_use]
pub fn payout_key(payout_id: &PayoutId) -> Vec<u8> {
    payout_id.to_bytes().to_vec()
}

/// Create an account-payout index key.
///
/// Format: `account_id (16 bytes) || payout_id (16 bytes)`
#[must_use]
pub fn account_payout_key(account_id: &AccountId, payout_id: &PayoutId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&payout_id.to_bytes());
    key
}

/// Prefix for iterating all payouts of an account.
#[must_use]
pub fn account_payouts_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Extract the payout ID from an account-payout index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_payout_id(key: &[u8]) -> PayoutId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    PayoutId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create an action key from an action ID.
#[must_use]
pub fn action_key(action_id: &ActionId) -> Vec<u8> {
    action_id.to_bytes().to_vec()
}

/// Create a target-action index key.
///
/// Format: `target_id bytes || 0x00 || action_id (16 bytes)`. The NUL
/// separator keeps one target's prefix from matching a longer target id.
#[must_use]
pub fn target_action_key(target_id: &str, action_id: &ActionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(target_id.len() + 17);
    key.extend_from_slice(target_id.as_bytes());
    key.push(0);
    key.extend_from_slice(&action_id.to_bytes());
    key
}

/// Prefix for iterating all actions recorded against a target.
#[must_use]
pub fn target_actions_prefix(target_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(target_id.len() + 1);
    key.extend_from_slice(target_id.as_bytes());
    key.push(0);
    key
}

/// Create an actor-action index key.
///
/// Format: `actor_id (16 bytes) || action_id (16 bytes)`
#[must_use]
pub fn actor_action_key(actor_id: &AdminId, action_id: &ActionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(actor_id.as_bytes());
    key.extend_from_slice(&action_id.to_bytes());
    key
}

/// Prefix for iterating all actions recorded by an actor.
#[must_use]
pub fn actor_actions_prefix(actor_id: &AdminId) -> Vec<u8> {
    actor_id.as_bytes().to_vec()
}

/// Extract the action ID from the tail of an index key.
///
/// # Panics
///
/// Panics if the key is shorter than 16 bytes.
#[must_use]
pub fn extract_action_id(key: &[u8]) -> ActionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[key.len() - 16..]);
    ActionId::from_bytes(bytes).expect("valid ULID bytes")
}

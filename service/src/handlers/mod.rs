//! HTTP request handlers.

pub mod accounts;
pub mod admin;
pub mod credits;
pub mod health;
pub mod payouts;
pub mod summaries;
pub mod webhooks;

//! Application layer orchestrating staging, reconciliation and rate resolution.
//!
//! `MultiCurrencyEngine` is the entry point for replaying POS sessions; the
//! services it composes are usable on their own by a host order-commit hook.

pub mod config_service;
pub mod engine;
pub mod rate_resolver;
pub mod reconciler;
pub mod stager;

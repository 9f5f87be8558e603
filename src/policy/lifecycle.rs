// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pure lifecycle rules: time-driven transitions, countdown computation,
//! and the policy error taxonomy.
//!
//! Nothing here touches a clock or a store; `now` is always supplied by the
//! caller, which keeps every rule testable without waiting for real time to
//! pass.

use chrono::{DateTime, Utc};

use crate::models::{CountdownResponse, Policy, PolicyStatus};

/// Seconds in a day, used for the countdown day floor.
const SECONDS_PER_DAY: i64 = 86_400;

/// Longest term a product may carry, in days (100 years).
///
/// Keeps `end_at = start_at + term_days` well inside chrono's representable
/// range, so activating a policy can never overflow the date arithmetic.
pub const MAX_TERM_DAYS: i64 = 36_500;

/// Business-rule failures of the lifecycle engine.
///
/// Each variant carries enough detail (kind + offending field) for the UI to
/// render an actionable message. Transitions that fail never mutate state.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("a non-terminal policy already exists for sku {sku_id}")]
    DuplicateActivePolicy { sku_id: String },

    #[error("cannot {action} a policy in status {from:?}")]
    InvalidTransition {
        from: PolicyStatus,
        action: &'static str,
    },

    #[error("payment {field} does not match the locked terms")]
    PaymentMismatch { field: &'static str },

    #[error("product {sku_id} is not available for purchase")]
    ProductUnavailable { sku_id: String },

    #[error("term of {term_days} days is out of range")]
    TermOutOfRange { term_days: i64 },
}

impl PolicyError {
    /// Machine-readable kind code for the API error body.
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyError::NotFound { .. } => "not_found",
            PolicyError::DuplicateActivePolicy { .. } => "duplicate_active_policy",
            PolicyError::InvalidTransition { .. } => "invalid_transition",
            PolicyError::PaymentMismatch { .. } => "payment_mismatch",
            PolicyError::ProductUnavailable { .. } => "product_unavailable",
            PolicyError::TermOutOfRange { .. } => "term_out_of_range",
        }
    }
}

/// Apply time-driven transitions to a policy in place.
///
/// - `active` with `now >= end_at` becomes `expired`
/// - `approved_awaiting_payment` with `now >= payment_due_at` becomes
///   `expired_unpaid`
///
/// Never mutates `start_at`/`end_at`. Idempotent: applying twice with the
/// same `now` is a no-op the second time.
pub fn apply_time_transitions(policy: &mut Policy, now: DateTime<Utc>) {
    match policy.status {
        PolicyStatus::Active => {
            if let Some(end_at) = policy.end_at {
                if now >= end_at {
                    policy.status = PolicyStatus::Expired;
                }
            }
        }
        PolicyStatus::ApprovedAwaitingPayment => {
            if let Some(due_at) = policy.payment_due_at {
                if now >= due_at {
                    policy.status = PolicyStatus::ExpiredUnpaid;
                }
            }
        }
        _ => {}
    }
}

/// Compute the remaining coverage time for a policy.
///
/// Returns zeros for any policy that is not `active` at `now`, including an
/// `active` one whose `end_at` has already passed.
pub fn countdown(policy: &Policy, now: DateTime<Utc>) -> CountdownResponse {
    let seconds_remaining = match (policy.status, policy.end_at) {
        (PolicyStatus::Active, Some(end_at)) => (end_at - now).num_seconds().max(0),
        _ => 0,
    };

    CountdownResponse {
        status: policy.status,
        now,
        start_at: policy.start_at,
        end_at: policy.end_at,
        seconds_remaining,
        days_remaining: seconds_remaining / SECONDS_PER_DAY,
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Policy Lifecycle Engine
//!
//! Owns policy state, transition rules, payment confirmation, and countdown
//! computation.
//!
//! State machine:
//!
//! ```text
//! pending → under_review → {approved_awaiting_payment | rejected}
//! approved_awaiting_payment → {active | expired_unpaid}
//! active → expired
//! ```
//!
//! `rejected`, `expired`, and `expired_unpaid` are terminal. Time-driven
//! transitions are pure functions of `(policy, now)` and are applied lazily
//! before every read and transition, so no caller ever observes an `active`
//! policy past its `end_at`.

pub mod lifecycle;
pub mod store;

pub use lifecycle::{apply_time_transitions, countdown, PolicyError, MAX_TERM_DAYS};
pub use store::PolicyStore;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain insurance policy issuance service.
//!
//! The crate is organised around three concerns:
//!
//! - [`auth`]: challenge-response wallet sign-in and stateless session
//!   tokens. No passwords, no server-side session table.
//! - [`policy`]: the policy lifecycle state machine and its in-memory
//!   store, including lazy time-driven expiry.
//! - [`hashing`]: canonical serialization and contract fingerprints, so
//!   equal terms always hash to the same digest.
//!
//! [`api`] exposes all of it over HTTP with OpenAPI documentation.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod hashing;
pub mod models;
pub mod policy;
pub mod state;

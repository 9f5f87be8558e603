// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Challenge-response wallet authentication for the policy issuance API.
//!
//! ## Auth Flow
//!
//! 1. Client requests a challenge nonce for its wallet address
//! 2. Client signs an EIP-4361-style message embedding the nonce (EIP-191
//!    personal-sign)
//! 3. Server parses the message, recovers the signer, consumes the nonce,
//!    and mints a short-lived HS256 bearer token bound to the address
//! 4. Subsequent requests present `Authorization: Bearer <token>`
//!
//! ## Security
//!
//! - Nonces are single-use with single-winner consume semantics
//! - Challenge verification failures are reported to the client as one
//!   opaque `authentication_failed`; the failing sub-step is only logged
//! - Tokens are stateless; expiry is the sole invalidation mechanism

pub mod challenge;
pub mod error;
pub mod extractor;
pub mod nonce;
pub mod session;
pub mod verify;

pub use challenge::Challenge;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use nonce::NonceStore;
pub use session::SessionIssuer;
pub use verify::verify_challenge;

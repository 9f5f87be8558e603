// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge signature verification.
//!
//! Verification order: parse the message, check the domain binding, recover
//! the EIP-191 signer and compare it to the claimed address, check the
//! `Issued At` clock-skew window, then consume the embedded nonce. A success
//! therefore uses up the nonce: each issued nonce verifies at most once.
//!
//! Every failure collapses into the opaque [`AuthError::AuthenticationFailed`];
//! the sub-step that refused is logged at debug level only.

use alloy::primitives::Signature;
use chrono::{DateTime, Utc};

use crate::auth::challenge::Challenge;
use crate::auth::error::AuthError;
use crate::auth::nonce::NonceStore;
use crate::models::WalletAddress;

/// Accepted clock skew around `Issued At`.
const ISSUED_AT_SKEW_SECONDS: i64 = 300;

/// Verify a signed challenge and consume its nonce.
///
/// Returns the authenticated (normalized) wallet address.
pub fn verify_challenge(
    message: &str,
    signature: &str,
    expected_domain: &str,
    nonces: &NonceStore,
    now: DateTime<Utc>,
) -> Result<WalletAddress, AuthError> {
    let challenge = Challenge::parse(message).map_err(|err| {
        tracing::debug!(error = %err, "challenge rejected: message did not parse");
        AuthError::AuthenticationFailed
    })?;

    if challenge.domain != expected_domain {
        tracing::debug!(
            domain = %challenge.domain,
            "challenge rejected: domain does not bind to this service"
        );
        return Err(AuthError::AuthenticationFailed);
    }

    let claimed = challenge.claimed_address();
    let recovered = recover_signer(message, signature)?;
    if recovered != claimed {
        tracing::debug!(
            claimed = %claimed,
            recovered = %recovered,
            "challenge rejected: recovered signer does not match claimed address"
        );
        return Err(AuthError::AuthenticationFailed);
    }

    let skew = (challenge.issued_at - now).num_seconds().abs();
    if skew > ISSUED_AT_SKEW_SECONDS {
        tracing::debug!(skew_seconds = skew, "challenge rejected: Issued At outside skew window");
        return Err(AuthError::AuthenticationFailed);
    }

    nonces.consume(&claimed, &challenge.nonce, now).map_err(|err| {
        tracing::debug!(error = %err, "challenge rejected: nonce did not consume");
        AuthError::AuthenticationFailed
    })?;

    Ok(claimed)
}

/// Recover the EIP-191 personal-sign signer of `message`.
fn recover_signer(message: &str, signature: &str) -> Result<WalletAddress, AuthError> {
    let signature: Signature = signature.trim().parse().map_err(|_| {
        tracing::debug!("challenge rejected: signature is not 65 hex-encoded bytes");
        AuthError::AuthenticationFailed
    })?;

    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| {
            tracing::debug!("challenge rejected: signature does not recover");
            AuthError::AuthenticationFailed
        })?;

    Ok(WalletAddress::normalize(&format!(
        "0x{}",
        hex::encode(recovered.as_slice())
    )))
}

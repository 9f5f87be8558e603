// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless session tokens.
//!
//! A verified signature is exchanged for a signed, time-bounded HS256 token
//! binding the wallet address. Nothing is stored server-side: validity is a
//! pure function of the token's signature and expiry, and logout is simply
//! the client discarding its copy.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::models::WalletAddress;

/// Fixed session lifetime.
pub const SESSION_TTL_MINUTES: i64 = 15;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Wallet address the token is bound to.
    sub: String,
    /// Issued-at (Unix seconds).
    iat: i64,
    /// Absolute expiry (Unix seconds).
    exp: i64,
}

/// Mints and validates session tokens.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Mint a token for an authenticated address, expiring after the fixed TTL.
    pub fn issue(&self, address: &WalletAddress, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sub: address.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(SESSION_TTL_MINUTES)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::InternalError(err.to_string()))
    }

    /// Validate a token against the supplied clock and return the bound address.
    ///
    /// Expiry is checked against `now` rather than the library's system
    /// clock, so expiry behavior is testable without waiting.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<WalletAddress, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::TokenInvalid)?;

        if now.timestamp() >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(WalletAddress::normalize(&data.claims.sub))
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for bearer-token authentication.
//!
//! Use the `Auth` extractor in handlers to require a valid session token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(address): Auth) -> impl IntoResponse {
//!     // address is the authenticated WalletAddress
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use super::error::AuthError;
use crate::models::WalletAddress;
use crate::state::AppState;

/// Extractor yielding the wallet address bound to the presented token.
pub struct Auth(pub WalletAddress);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let address = state.sessions.validate(token, Utc::now())?;
        Ok(Auth(address))
    }
}

/// Extractor that additionally requires the address to be a configured admin.
pub struct AdminOnly(pub WalletAddress);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(address) = Auth::from_request_parts(parts, state).await?;

        if !state.auth.admin_addresses.contains(&address) {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(AdminOnly(address))
    }
}

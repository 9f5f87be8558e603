// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sign-in endpoints: challenge issuance, signature verification,
//! token introspection.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    auth::{verify_challenge, Auth, AuthError},
    error::ApiError,
    models::{
        ChallengeRequest, ChallengeResponse, VerifyRequest, VerifyResponse, WalletAddress,
        WhoamiResponse,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/auth/challenge",
    request_body = ChallengeRequest,
    tag = "Auth",
    responses(
        (status = 200, body = ChallengeResponse),
        (status = 400, description = "Malformed wallet address")
    )
)]
pub async fn request_challenge(
    State(state): State<AppState>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    if !WalletAddress::is_valid_format(request.address.trim()) {
        return Err(ApiError::bad_request("address must be 0x-prefixed 20-byte hex"));
    }
    let address = WalletAddress::normalize(&request.address);
    let record = state.nonces.issue(&address, Utc::now());

    Ok(Json(ChallengeResponse {
        address,
        nonce: record.nonce,
        expires_at: record.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, body = VerifyResponse),
        (status = 401, description = "Authentication failed")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AuthError> {
    let now = Utc::now();
    let address = verify_challenge(
        &request.message,
        &request.signature,
        &state.auth.domain,
        &state.nonces,
        now,
    )?;
    let token = state.sessions.issue(&address, now)?;

    tracing::info!(address = %address, "wallet signed in");
    Ok(Json(VerifyResponse { token, address }))
}

#[utoipa::path(
    get,
    path = "/v1/auth/whoami",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = WhoamiResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn whoami(Auth(address): Auth) -> Json<WhoamiResponse> {
    Json(WhoamiResponse { address })
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uniform API error responses.
//!
//! Every error leaves the service as `{"error": "...", "kind": "..."}`.
//! Authentication failures are deliberately undifferentiated: the verifying
//! sub-step that failed is logged server-side but never returned, so a caller
//! probing the challenge flow learns nothing about why a forgery was refused.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::policy::PolicyError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// The one opaque signal for every challenge/signature/nonce problem.
    pub fn authentication_failed() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "authentication_failed",
            "authentication failed",
        )
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let status = match &err {
            PolicyError::NotFound { .. } => StatusCode::NOT_FOUND,
            PolicyError::DuplicateActivePolicy { .. } | PolicyError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            PolicyError::PaymentMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PolicyError::ProductUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PolicyError::TermOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            kind: self.kind,
        });
        (self.status, body).into_response()
    }
}

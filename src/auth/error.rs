// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// `AuthenticationFailed` is deliberately a single undifferentiated variant:
/// every challenge, signature, and nonce problem collapses into it before
/// leaving the service, so the response never reveals which verification
/// sub-step refused a forgery.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Bearer token has expired
    TokenExpired,
    /// Bearer token failed its integrity check or is malformed
    TokenInvalid,
    /// Challenge verification failed (opaque, covers all sub-steps)
    AuthenticationFailed,
    /// Authenticated but not allowed to perform the operation
    InsufficientPermissions,
    /// Internal error (e.g. token signing failure)
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    kind: &'static str,
}

impl AuthError {
    /// Machine-readable kind code for the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::AuthenticationFailed => "authentication_failed",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenInvalid => write!(f, "Token is invalid"),
            AuthError::AuthenticationFailed => write!(f, "authentication failed"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        });
        (status, body).into_response()
    }
}

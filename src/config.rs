// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_SECRET` | HMAC secret for session tokens | Random per boot |
//! | `ADMIN_ADDRESSES` | Comma-separated admin wallet addresses | Empty |
//! | `SIWE_DOMAIN` | Domain challenge messages must bind to | `cover.example.org` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the session token HMAC secret.
///
/// When unset, a random secret is generated at boot; tokens then stop
/// validating across restarts, which is acceptable for a 15-minute TTL.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Environment variable name for the comma-separated admin address list.
pub const ADMIN_ADDRESSES_ENV: &str = "ADMIN_ADDRESSES";

/// Environment variable name for the expected challenge domain binding.
pub const SIWE_DOMAIN_ENV: &str = "SIWE_DOMAIN";

/// Environment variable name selecting the log formatter.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-4361-style challenge messages.
//!
//! The textual grammar, rendered by [`Challenge::to_message`]:
//!
//! ```text
//! <domain> wants you to sign in with your Ethereum account:
//! <address>
//!
//! [<statement>]
//!
//! URI: <uri>
//! Version: 1
//! Chain ID: <chain-id>
//! Nonce: <nonce>
//! Issued At: <RFC3339>
//! ```
//!
//! Parsing is strict. When a statement is present, exactly one blank line
//! must separate it from the field block: a statement glued to the fields or
//! followed by two blank lines is a parse failure, not something to repair.

use chrono::{DateTime, Utc};

use crate::models::WalletAddress;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";

/// The challenge message version this service accepts.
pub const CHALLENGE_VERSION: &str = "1";

/// A parsed sign-in challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Domain requesting the signature (binds the message to this service).
    pub domain: String,
    /// Claimed wallet address, exactly as written in the message.
    pub address: String,
    /// Optional human-readable statement shown by the wallet.
    pub statement: Option<String>,
    /// URI of the signing resource.
    pub uri: String,
    /// EVM chain the sign-in targets.
    pub chain_id: u64,
    /// Single-use nonce issued by this service.
    pub nonce: String,
    /// When the client composed the message.
    pub issued_at: DateTime<Utc>,
}

/// Why a challenge message failed to parse.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeParseError {
    #[error("malformed header line")]
    Header,
    #[error("malformed address line")]
    Address,
    #[error("malformed statement separator")]
    Separator,
    #[error("missing or out-of-order field: {0}")]
    Field(&'static str),
    #[error("invalid value for field: {0}")]
    FieldValue(&'static str),
    #[error("unexpected trailing content")]
    Trailing,
}

impl Challenge {
    /// Strictly parse a challenge message.
    pub fn parse(message: &str) -> Result<Self, ChallengeParseError> {
        let lines: Vec<&str> = message.split('\n').collect();

        let header = lines.first().ok_or(ChallengeParseError::Header)?;
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .ok_or(ChallengeParseError::Header)?;
        if domain.is_empty() || domain.contains(' ') {
            return Err(ChallengeParseError::Header);
        }

        let address = *lines.get(1).ok_or(ChallengeParseError::Address)?;
        if !WalletAddress::is_valid_format(address) {
            return Err(ChallengeParseError::Address);
        }

        // The line after the address is always blank.
        if lines.get(2).copied() != Some("") {
            return Err(ChallengeParseError::Separator);
        }

        // A second blank line means no statement; any other content is the
        // statement and must be followed by exactly one blank line.
        let (statement, fields_start) = match lines.get(3).copied() {
            Some("") => (None, 4),
            Some(text) => {
                if lines.get(4).copied() != Some("") {
                    return Err(ChallengeParseError::Separator);
                }
                (Some(text.to_string()), 5)
            }
            None => return Err(ChallengeParseError::Separator),
        };

        let mut fields = lines[fields_start.min(lines.len())..].iter();
        let uri = tagged_line(fields.next(), URI_TAG, "URI")?;
        let version = tagged_line(fields.next(), VERSION_TAG, "Version")?;
        if version != CHALLENGE_VERSION {
            return Err(ChallengeParseError::FieldValue("Version"));
        }
        let chain_id = tagged_line(fields.next(), CHAIN_ID_TAG, "Chain ID")?
            .parse::<u64>()
            .map_err(|_| ChallengeParseError::FieldValue("Chain ID"))?;
        let nonce = tagged_line(fields.next(), NONCE_TAG, "Nonce")?;
        if nonce.is_empty() || !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ChallengeParseError::FieldValue("Nonce"));
        }
        let issued_at = DateTime::parse_from_rfc3339(&tagged_line(
            fields.next(),
            ISSUED_AT_TAG,
            "Issued At",
        )?)
        .map_err(|_| ChallengeParseError::FieldValue("Issued At"))?
        .with_timezone(&Utc);

        // Nothing may follow the mandatory field block.
        if fields.next().is_some() {
            return Err(ChallengeParseError::Trailing);
        }

        Ok(Challenge {
            domain: domain.to_string(),
            address: address.to_string(),
            statement,
            uri,
            chain_id,
            nonce,
            issued_at,
        })
    }

    /// Render the message to sign. `parse` of the result round-trips.
    pub fn to_message(&self) -> String {
        let mut message = format!("{}{}\n{}\n\n", self.domain, HEADER_SUFFIX, self.address);
        if let Some(statement) = &self.statement {
            message.push_str(statement);
            message.push('\n');
        }
        message.push('\n');
        message.push_str(&format!(
            "{URI_TAG}{}\n{VERSION_TAG}{CHALLENGE_VERSION}\n{CHAIN_ID_TAG}{}\n{NONCE_TAG}{}\n{ISSUED_AT_TAG}{}",
            self.uri,
            self.chain_id,
            self.nonce,
            self.issued_at.to_rfc3339(),
        ));
        message
    }

    /// The claimed address, normalized.
    pub fn claimed_address(&self) -> WalletAddress {
        WalletAddress::normalize(&self.address)
    }
}

fn tagged_line(
    line: Option<&&str>,
    tag: &str,
    name: &'static str,
) -> Result<String, ChallengeParseError> {
    line.and_then(|l| l.strip_prefix(tag))
        .map(str::to_string)
        .ok_or(ChallengeParseError::Field(name))
}

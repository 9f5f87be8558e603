// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request/response structures and core domain records for the policy
//! issuance service. All types derive `Serialize`, `Deserialize`, and
//! `ToSchema` for automatic JSON handling and OpenAPI documentation.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters). Addresses are normalized to lowercase on construction
//! so that case differences never split a user's records.
//!
//! ## Model Categories
//!
//! - **Products**: immutable catalog entries (SKUs) priced in token base units
//! - **Policies**: lifecycle records owned by a wallet address
//! - **Payments**: append-only premium payment evidence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address, normalized to lowercase.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Normalize an address string to lowercase.
    ///
    /// Does not validate the format; use [`WalletAddress::is_valid_format`]
    /// where malformed input must be rejected.
    pub fn normalize(value: &str) -> Self {
        WalletAddress(value.trim().to_ascii_lowercase())
    }

    /// Check that a raw string is `0x` followed by exactly 40 hex characters.
    pub fn is_valid_format(value: &str) -> bool {
        let Some(hex_part) = value.strip_prefix("0x") else {
            return false;
        };
        hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress::normalize(value)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress::normalize(&value)
    }
}

// =============================================================================
// Product (SKU) Models
// =============================================================================

/// Catalog availability of a product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

/// An immutable insurance product (SKU).
///
/// Amounts are decimal strings in token base units; `decimals` records the
/// token's display precision. The lifecycle engine treats products as
/// read-only: policy terms are snapshotted from the product at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Product {
    /// Unique identifier for this SKU.
    pub id: String,
    /// Human-readable product name.
    pub name: String,
    /// EVM chain the premium is paid on.
    pub chain_id: u64,
    /// ERC-20 token contract accepted for premium payment.
    pub token_address: String,
    /// Token display decimals.
    pub decimals: u8,
    /// Premium amount in token base units.
    pub premium_amount: String,
    /// Coverage amount in token base units.
    pub coverage_amount: String,
    /// Coverage term in days, counted from payment confirmation.
    pub term_days: i64,
    /// Whether the product can currently be purchased.
    pub status: ProductStatus,
}

/// Request to create a new product (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub chain_id: u64,
    pub token_address: String,
    pub decimals: u8,
    pub premium_amount: String,
    pub coverage_amount: String,
    pub term_days: i64,
}

// =============================================================================
// Policy Models
// =============================================================================

/// Lifecycle status of a policy.
///
/// `Rejected`, `Expired`, and `ExpiredUnpaid` are terminal: they release the
/// (owner, sku) slot for repurchase and accept no further transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Pending,
    UnderReview,
    ApprovedAwaitingPayment,
    Active,
    Rejected,
    Expired,
    ExpiredUnpaid,
}

impl PolicyStatus {
    /// Terminal states do not block repurchase of the same SKU.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PolicyStatus::Rejected | PolicyStatus::Expired | PolicyStatus::ExpiredUnpaid
        )
    }
}

/// An insurance policy owned by a wallet address.
///
/// Premium, coverage, and term are snapshotted from the product at creation
/// so later catalog edits never change what the holder agreed to. The
/// `contract_hash` is computed exactly once, over those locked terms, and is
/// never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Policy {
    /// Unique identifier for this policy.
    pub id: String,
    /// The product this policy was purchased against.
    pub sku_id: String,
    /// The wallet that owns this policy.
    pub owner_address: WalletAddress,
    /// Locked premium amount (token base units).
    pub premium_amount: String,
    /// Locked coverage amount (token base units).
    pub coverage_amount: String,
    /// Locked coverage term in days.
    pub term_days: i64,
    /// Locked payment token contract.
    pub token_address: String,
    /// Locked payment chain.
    pub chain_id: u64,
    /// Current lifecycle status.
    pub status: PolicyStatus,
    /// When the policy was created.
    pub created_at: DateTime<Utc>,
    /// When an administrative decision (approve/reject) was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Payment deadline, set on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_due_at: Option<DateTime<Utc>>,
    /// Coverage start, set on payment confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    /// Coverage end, `start_at + term_days`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    /// Canonical digest over the locked terms (tamper-evidence anchor).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_hash: Option<String>,
    /// Optional note left by the reviewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_note: Option<String>,
    /// Premium payments recorded against this policy (append-only).
    pub payments: Vec<Payment>,
}

/// Request to purchase a policy for a SKU.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePolicyRequest {
    /// The product to purchase.
    pub sku_id: String,
}

/// Administrative review decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Move a pending policy into manual review.
    UnderReview,
    /// Approve; the policy awaits premium payment.
    Approve,
    /// Reject; terminal, releases the repurchase slot.
    Reject,
}

/// Request body for the review endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    /// Optional note shown to the policy holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// =============================================================================
// Payment Models
// =============================================================================

/// A recorded premium payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Payment {
    /// Unique identifier for this payment record.
    pub id: String,
    /// The policy this payment was made against.
    pub policy_id: String,
    /// On-chain transaction hash.
    pub tx_hash: String,
    /// Chain the payment was made on.
    pub chain_id: u64,
    /// Paid amount in token base units.
    pub amount: String,
    /// Token contract the payment used.
    pub token: String,
    /// When the payment was recorded.
    pub paid_at: DateTime<Utc>,
}

/// Payment evidence submitted to confirm a premium payment.
///
/// Recording the evidence and confirming the payment is one transition:
/// evidence that does not match the locked terms is rejected outright and
/// nothing is appended.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentEvidence {
    pub tx_hash: String,
    pub chain_id: u64,
    pub amount: String,
    pub token: String,
}

// =============================================================================
// Auth Flow Models
// =============================================================================

/// Request for a sign-in challenge nonce.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeRequest {
    /// Wallet address requesting to sign in.
    pub address: String,
}

/// Issued challenge nonce.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    /// Normalized wallet address the nonce is bound to.
    pub address: WalletAddress,
    /// Single-use nonce to embed in the signed message.
    pub nonce: String,
    /// When the nonce stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Signed challenge submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// The full challenge message that was signed.
    pub message: String,
    /// Hex-encoded 65-byte EIP-191 signature.
    pub signature: String,
}

/// Successful verification result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// Short-lived bearer token for subsequent requests.
    pub token: String,
    /// The authenticated wallet address.
    pub address: WalletAddress,
}

/// Identity of the presented bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WhoamiResponse {
    pub address: WalletAddress,
}

// =============================================================================
// Countdown & Stats Models
// =============================================================================

/// Remaining coverage time for a policy.
///
/// Zeroed for any policy that is not currently active.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountdownResponse {
    pub status: PolicyStatus,
    /// Server clock the countdown was computed against.
    pub now: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    pub seconds_remaining: i64,
    pub days_remaining: i64,
}

/// Review decision counts since a caller-supplied day start.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewStatsResponse {
    /// Start of the reporting window (caller-supplied UTC midnight).
    pub since: DateTime<Utc>,
    pub approved: usize,
    pub rejected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_normalizes_to_lowercase() {
        let addr = WalletAddress::from("0xAbCdEF0123456789abcdef0123456789ABCDEF01");
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn wallet_address_format_validation() {
        assert!(WalletAddress::is_valid_format(
            "0xabcdef0123456789abcdef0123456789abcdef01"
        ));
        assert!(!WalletAddress::is_valid_format(
            "abcdef0123456789abcdef0123456789abcdef01"
        ));
        assert!(!WalletAddress::is_valid_format("0x1234"));
        assert!(!WalletAddress::is_valid_format(
            "0xzzcdef0123456789abcdef0123456789abcdef01"
        ));
    }

    #[test]
    fn terminal_states_release_the_slot() {
        assert!(PolicyStatus::Rejected.is_terminal());
        assert!(PolicyStatus::Expired.is_terminal());
        assert!(PolicyStatus::ExpiredUnpaid.is_terminal());
        assert!(!PolicyStatus::Pending.is_terminal());
        assert!(!PolicyStatus::UnderReview.is_terminal());
        assert!(!PolicyStatus::ApprovedAwaitingPayment.is_terminal());
        assert!(!PolicyStatus::Active.is_terminal());
    }

    #[test]
    fn policy_status_serializes_snake_case() {
        let json = serde_json::to_string(&PolicyStatus::ApprovedAwaitingPayment).unwrap();
        assert_eq!(json, r#""approved_awaiting_payment""#);
    }
}

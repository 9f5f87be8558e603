// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory policy and product store.
//!
//! All mutating operations run under the single `AppState` write lock, which
//! makes every check-and-set here atomic: concurrent create attempts for the
//! same (owner, sku) pair cannot both pass the duplicate check, and a
//! transition either fully applies or leaves the record untouched.
//!
//! Time-driven transitions are folded in lazily: every lookup and every
//! transition first applies [`apply_time_transitions`] so no caller observes
//! an `active` policy past its `end_at` or a stale payment deadline.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::hashing::canonical_hash;
use crate::models::{
    CreateProductRequest, Payment, PaymentEvidence, Policy, PolicyStatus, Product, ProductStatus,
    ReviewDecision, WalletAddress,
};
use crate::policy::lifecycle::{apply_time_transitions, PolicyError};

/// How long an approved policy waits for its premium before expiring unpaid.
const PAYMENT_WINDOW_DAYS: i64 = 7;

#[derive(Default)]
pub struct PolicyStore {
    products: HashMap<String, Product>,
    policies: HashMap<String, Policy>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Product catalog (read-only to the lifecycle engine)
    // =========================================================================

    pub fn insert_product(&mut self, request: CreateProductRequest) -> Product {
        let id = Uuid::new_v4().to_string();
        let product = Product {
            id: id.clone(),
            name: request.name,
            chain_id: request.chain_id,
            token_address: request.token_address.to_ascii_lowercase(),
            decimals: request.decimals,
            premium_amount: request.premium_amount,
            coverage_amount: request.coverage_amount,
            term_days: request.term_days,
            status: ProductStatus::Active,
        };
        self.products.insert(id, product.clone());
        product
    }

    pub fn list_active_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|product| product.status == ProductStatus::Active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    // =========================================================================
    // Policy lifecycle
    // =========================================================================

    /// Create a policy in `pending` for an authenticated owner.
    ///
    /// Fails with `DuplicateActivePolicy` while a non-terminal policy exists
    /// for the same (owner, sku) pair. The product's current premium,
    /// coverage, and term are snapshotted onto the policy and the contract
    /// hash is computed over those locked terms, exactly once.
    pub fn create_policy(
        &mut self,
        owner: &WalletAddress,
        sku_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Policy, PolicyError> {
        let product = self
            .products
            .get(sku_id)
            .ok_or(PolicyError::NotFound { entity: "product" })?
            .clone();

        if product.status != ProductStatus::Active {
            return Err(PolicyError::ProductUnavailable {
                sku_id: sku_id.to_string(),
            });
        }

        // A slot blocked only by a policy whose time has run out must open
        // up, so fold in time transitions before the duplicate check.
        for policy in self.policies.values_mut() {
            if policy.owner_address == *owner && policy.sku_id == sku_id {
                apply_time_transitions(policy, now);
            }
        }

        let duplicate = self.policies.values().any(|policy| {
            policy.owner_address == *owner
                && policy.sku_id == sku_id
                && !policy.status.is_terminal()
        });
        if duplicate {
            return Err(PolicyError::DuplicateActivePolicy {
                sku_id: sku_id.to_string(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let contract_hash = canonical_hash(&json!({
            "policy_id": id,
            "sku_id": product.id,
            "owner_address": owner.as_str(),
            "premium_amount": product.premium_amount,
            "coverage_amount": product.coverage_amount,
            "term_days": product.term_days,
            "token_address": product.token_address,
            "chain_id": product.chain_id,
        }));

        let policy = Policy {
            id: id.clone(),
            sku_id: product.id,
            owner_address: owner.clone(),
            premium_amount: product.premium_amount,
            coverage_amount: product.coverage_amount,
            term_days: product.term_days,
            token_address: product.token_address,
            chain_id: product.chain_id,
            status: PolicyStatus::Pending,
            created_at: now,
            decided_at: None,
            payment_due_at: None,
            start_at: None,
            end_at: None,
            contract_hash: Some(contract_hash),
            reviewer_note: None,
            payments: Vec::new(),
        };
        self.policies.insert(id, policy.clone());
        Ok(policy)
    }

    /// Apply an administrative review decision.
    ///
    /// `under_review` is only reachable from `pending`; approve and reject
    /// are accepted from `pending` or `under_review`. Approval stamps the
    /// payment deadline but sets no coverage dates. Rejection is terminal.
    pub fn review_policy(
        &mut self,
        policy_id: &str,
        decision: ReviewDecision,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Policy, PolicyError> {
        let policy = self
            .policies
            .get_mut(policy_id)
            .ok_or(PolicyError::NotFound { entity: "policy" })?;
        apply_time_transitions(policy, now);

        let reviewable = matches!(
            policy.status,
            PolicyStatus::Pending | PolicyStatus::UnderReview
        );

        match decision {
            ReviewDecision::UnderReview => {
                if policy.status != PolicyStatus::Pending {
                    return Err(PolicyError::InvalidTransition {
                        from: policy.status,
                        action: "start review of",
                    });
                }
                policy.status = PolicyStatus::UnderReview;
            }
            ReviewDecision::Approve => {
                if !reviewable {
                    return Err(PolicyError::InvalidTransition {
                        from: policy.status,
                        action: "approve",
                    });
                }
                policy.status = PolicyStatus::ApprovedAwaitingPayment;
                policy.decided_at = Some(now);
                policy.payment_due_at = Some(now + Duration::days(PAYMENT_WINDOW_DAYS));
            }
            ReviewDecision::Reject => {
                if !reviewable {
                    return Err(PolicyError::InvalidTransition {
                        from: policy.status,
                        action: "reject",
                    });
                }
                policy.status = PolicyStatus::Rejected;
                policy.decided_at = Some(now);
            }
        }

        if note.is_some() {
            policy.reviewer_note = note;
        }
        Ok(policy.clone())
    }

    /// Confirm a premium payment and activate coverage.
    ///
    /// The evidence must match the locked terms exactly; a mismatch fails
    /// with `PaymentMismatch` naming the offending field and appends nothing.
    /// On success the payment record is appended, `start_at = now`, and
    /// `end_at = start_at + term_days`.
    pub fn confirm_payment(
        &mut self,
        policy_id: &str,
        evidence: PaymentEvidence,
        now: DateTime<Utc>,
    ) -> Result<Policy, PolicyError> {
        let policy = self
            .policies
            .get_mut(policy_id)
            .ok_or(PolicyError::NotFound { entity: "policy" })?;
        apply_time_transitions(policy, now);

        if policy.status != PolicyStatus::ApprovedAwaitingPayment {
            return Err(PolicyError::InvalidTransition {
                from: policy.status,
                action: "confirm payment for",
            });
        }

        // All checks, including the fallible date arithmetic, precede any
        // mutation so a refused confirmation is side-effect free.
        if evidence.chain_id != policy.chain_id {
            return Err(PolicyError::PaymentMismatch { field: "chain_id" });
        }
        if !evidence.token.eq_ignore_ascii_case(&policy.token_address) {
            return Err(PolicyError::PaymentMismatch { field: "token" });
        }
        if evidence.amount.trim() != policy.premium_amount {
            return Err(PolicyError::PaymentMismatch { field: "amount" });
        }
        let end_at = Duration::try_days(policy.term_days)
            .and_then(|term| now.checked_add_signed(term))
            .ok_or(PolicyError::TermOutOfRange {
                term_days: policy.term_days,
            })?;

        policy.payments.push(Payment {
            id: Uuid::new_v4().to_string(),
            policy_id: policy.id.clone(),
            tx_hash: evidence.tx_hash,
            chain_id: evidence.chain_id,
            amount: evidence.amount,
            token: evidence.token.to_ascii_lowercase(),
            paid_at: now,
        });
        policy.status = PolicyStatus::Active;
        policy.start_at = Some(now);
        policy.end_at = Some(end_at);
        Ok(policy.clone())
    }

    /// Fetch a policy with time transitions applied.
    pub fn policy(&mut self, policy_id: &str, now: DateTime<Utc>) -> Result<Policy, PolicyError> {
        let policy = self
            .policies
            .get_mut(policy_id)
            .ok_or(PolicyError::NotFound { entity: "policy" })?;
        apply_time_transitions(policy, now);
        Ok(policy.clone())
    }

    /// All policies owned by a wallet, time transitions applied.
    pub fn policies_for(&mut self, owner: &WalletAddress, now: DateTime<Utc>) -> Vec<Policy> {
        let mut owned: Vec<Policy> = self
            .policies
            .values_mut()
            .filter(|policy| policy.owner_address == *owner)
            .map(|policy| {
                apply_time_transitions(policy, now);
                policy.clone()
            })
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    /// Count review decisions made at or after `since`.
    ///
    /// `since` is a caller-supplied UTC day start; timezone policy stays with
    /// the reporting caller. A rejected policy stays `rejected` forever, so
    /// everything else with a decision timestamp was an approval.
    pub fn review_stats(&self, since: DateTime<Utc>) -> (usize, usize) {
        let mut approved = 0;
        let mut rejected = 0;
        for policy in self.policies.values() {
            let Some(decided_at) = policy.decided_at else {
                continue;
            };
            if decided_at < since {
                continue;
            }
            if policy.status == PolicyStatus::Rejected {
                rejected += 1;
            } else {
                approved += 1;
            }
        }
        (approved, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> WalletAddress {
        WalletAddress::from("0x00000000000000000000000000000000000000aa")
    }

    fn sample_product_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Gold Cover".into(),
            chain_id: 43114,
            token_address: "0x00000000000000000000000000000000000000BB".into(),
            decimals: 6,
            premium_amount: "1000000".into(),
            coverage_amount: "50000000".into(),
            term_days: 90,
        }
    }

    fn matching_evidence(policy: &Policy) -> PaymentEvidence {
        PaymentEvidence {
            tx_hash: "0xdeadbeef".into(),
            chain_id: policy.chain_id,
            amount: policy.premium_amount.clone(),
            token: policy.token_address.clone(),
        }
    }

    #[test]
    fn create_policy_snapshots_terms_and_hashes_once() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();

        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        assert_eq!(policy.status, PolicyStatus::Pending);
        assert_eq!(policy.premium_amount, "1000000");
        assert_eq!(policy.term_days, 90);
        // Token addresses are stored lowercase.
        assert_eq!(
            policy.token_address,
            "0x00000000000000000000000000000000000000bb"
        );
        let hash = policy.contract_hash.clone().unwrap();
        assert!(hash.starts_with("0x") && hash.len() == 66);
        assert!(policy.start_at.is_none() && policy.end_at.is_none());
    }

    #[test]
    fn unknown_product_is_not_found() {
        let mut store = PolicyStore::new();
        let err = store.create_policy(&owner(), "missing", Utc::now()).unwrap_err();
        assert_eq!(err, PolicyError::NotFound { entity: "product" });
    }

    #[test]
    fn duplicate_in_flight_policy_is_rejected_until_terminal() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();

        let first = store.create_policy(&owner(), &product.id, now).unwrap();
        let err = store.create_policy(&owner(), &product.id, now).unwrap_err();
        assert_eq!(
            err,
            PolicyError::DuplicateActivePolicy {
                sku_id: product.id.clone()
            }
        );

        // Another wallet is unaffected by this owner's slot.
        let other = WalletAddress::from("0x00000000000000000000000000000000000000cc");
        store.create_policy(&other, &product.id, now).unwrap();

        // Rejection releases the slot for repurchase.
        store
            .review_policy(&first.id, ReviewDecision::Reject, None, now)
            .unwrap();
        store.create_policy(&owner(), &product.id, now).unwrap();
    }

    #[test]
    fn review_walks_the_state_machine() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();

        let reviewed = store
            .review_policy(&policy.id, ReviewDecision::UnderReview, None, now)
            .unwrap();
        assert_eq!(reviewed.status, PolicyStatus::UnderReview);

        let approved = store
            .review_policy(
                &policy.id,
                ReviewDecision::Approve,
                Some("looks fine".into()),
                now,
            )
            .unwrap();
        assert_eq!(approved.status, PolicyStatus::ApprovedAwaitingPayment);
        assert_eq!(approved.reviewer_note.as_deref(), Some("looks fine"));
        assert_eq!(
            approved.payment_due_at,
            Some(now + Duration::days(PAYMENT_WINDOW_DAYS))
        );
        // Approval sets no coverage dates yet.
        assert!(approved.start_at.is_none() && approved.end_at.is_none());

        // Re-reviewing an approved policy is an illegal transition.
        let err = store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidTransition { .. }));
    }

    #[test]
    fn under_review_is_only_reachable_from_pending() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();

        store
            .review_policy(&policy.id, ReviewDecision::Reject, None, now)
            .unwrap();
        let err = store
            .review_policy(&policy.id, ReviewDecision::UnderReview, None, now)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::InvalidTransition {
                from: PolicyStatus::Rejected,
                action: "start review of",
            }
        );
    }

    #[test]
    fn payment_on_pending_policy_is_invalid_transition() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();

        let err = store
            .confirm_payment(&policy.id, matching_evidence(&policy), now)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::InvalidTransition {
                from: PolicyStatus::Pending,
                action: "confirm payment for",
            }
        );
    }

    #[test]
    fn mismatched_payment_fails_and_mutates_nothing() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap();

        let mut wrong_amount = matching_evidence(&policy);
        wrong_amount.amount = "999".into();
        let err = store
            .confirm_payment(&policy.id, wrong_amount, now)
            .unwrap_err();
        assert_eq!(err, PolicyError::PaymentMismatch { field: "amount" });

        let mut wrong_token = matching_evidence(&policy);
        wrong_token.token = "0x00000000000000000000000000000000000000dd".into();
        let err = store
            .confirm_payment(&policy.id, wrong_token, now)
            .unwrap_err();
        assert_eq!(err, PolicyError::PaymentMismatch { field: "token" });

        let mut wrong_chain = matching_evidence(&policy);
        wrong_chain.chain_id = 1;
        let err = store
            .confirm_payment(&policy.id, wrong_chain, now)
            .unwrap_err();
        assert_eq!(err, PolicyError::PaymentMismatch { field: "chain_id" });

        let unchanged = store.policy(&policy.id, now).unwrap();
        assert_eq!(unchanged.status, PolicyStatus::ApprovedAwaitingPayment);
        assert!(unchanged.payments.is_empty());
    }

    #[test]
    fn confirmed_payment_activates_coverage() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap();

        // Token case differences must not fail the match.
        let mut evidence = matching_evidence(&policy);
        evidence.token = evidence.token.to_ascii_uppercase().replace("0X", "0x");

        let active = store.confirm_payment(&policy.id, evidence, now).unwrap();
        assert_eq!(active.status, PolicyStatus::Active);
        assert_eq!(active.start_at, Some(now));
        assert_eq!(active.end_at, Some(now + Duration::days(90)));
        assert_eq!(active.payments.len(), 1);
        assert_eq!(active.payments[0].amount, policy.premium_amount);
    }

    #[test]
    fn oversized_term_fails_before_any_mutation() {
        let mut store = PolicyStore::new();
        let mut request = sample_product_request();
        request.term_days = i64::MAX;
        let product = store.insert_product(request);
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap();

        let err = store
            .confirm_payment(&policy.id, matching_evidence(&policy), now)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::TermOutOfRange {
                term_days: i64::MAX
            }
        );

        // The refused confirmation left the record exactly as it was.
        let unchanged = store.policy(&policy.id, now).unwrap();
        assert_eq!(unchanged.status, PolicyStatus::ApprovedAwaitingPayment);
        assert!(unchanged.payments.is_empty());
        assert!(unchanged.start_at.is_none() && unchanged.end_at.is_none());
    }

    #[test]
    fn unpaid_policy_expires_and_releases_slot() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap();

        let later = now + Duration::days(PAYMENT_WINDOW_DAYS) + Duration::seconds(1);
        let err = store
            .confirm_payment(&policy.id, matching_evidence(&policy), later)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::InvalidTransition {
                from: PolicyStatus::ExpiredUnpaid,
                action: "confirm payment for",
            }
        );

        // The lapsed slot opens for repurchase.
        store.create_policy(&owner(), &product.id, later).unwrap();
    }

    #[test]
    fn expired_active_policy_releases_slot() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let now = Utc::now();
        let policy = store.create_policy(&owner(), &product.id, now).unwrap();
        store
            .review_policy(&policy.id, ReviewDecision::Approve, None, now)
            .unwrap();
        store
            .confirm_payment(&policy.id, matching_evidence(&policy), now)
            .unwrap();

        let after_term = now + Duration::days(90) + Duration::seconds(1);
        let expired = store.policy(&policy.id, after_term).unwrap();
        assert_eq!(expired.status, PolicyStatus::Expired);

        store
            .create_policy(&owner(), &product.id, after_term)
            .unwrap();
    }

    #[test]
    fn review_stats_window_by_decision_time() {
        let mut store = PolicyStore::new();
        let product = store.insert_product(sample_product_request());
        let day_start = Utc::now();
        let yesterday = day_start - Duration::days(1);

        let old = store
            .create_policy(&owner(), &product.id, yesterday)
            .unwrap();
        store
            .review_policy(&old.id, ReviewDecision::Reject, None, yesterday)
            .unwrap();

        let fresh = store
            .create_policy(&owner(), &product.id, day_start)
            .unwrap();
        store
            .review_policy(&fresh.id, ReviewDecision::Approve, None, day_start)
            .unwrap();

        let other = WalletAddress::from("0x00000000000000000000000000000000000000cc");
        let rejected_today = store
            .create_policy(&other, &product.id, day_start)
            .unwrap();
        store
            .review_policy(&rejected_today.id, ReviewDecision::Reject, None, day_start)
            .unwrap();

        let (approved, rejected) = store.review_stats(day_start);
        assert_eq!(approved, 1);
        assert_eq!(rejected, 1);
    }
}

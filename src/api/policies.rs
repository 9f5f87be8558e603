// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Policy lifecycle endpoints.
//!
//! All mutations take the store's write lock for the full check-and-set, so
//! the duplicate-policy invariant and the all-or-nothing transition rules
//! hold under concurrent requests.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{
        CountdownResponse, CreatePolicyRequest, PaymentEvidence, Policy, ReviewRequest,
    },
    policy::countdown,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/policies",
    request_body = CreatePolicyRequest,
    tag = "Policies",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Policy),
        (status = 409, description = "A non-terminal policy already exists for this SKU")
    )
)]
pub async fn create_policy(
    Auth(owner): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<Policy>), ApiError> {
    let mut store = state.store.write().await;
    let policy = store.create_policy(&owner, &request.sku_id, Utc::now())?;
    tracing::info!(owner = %owner, policy_id = %policy.id, sku_id = %policy.sku_id, "policy created");
    Ok((StatusCode::CREATED, Json(policy)))
}

#[utoipa::path(
    get,
    path = "/v1/policies",
    tag = "Policies",
    security(("bearer" = [])),
    responses((status = 200, body = [Policy]))
)]
pub async fn list_policies(
    Auth(owner): Auth,
    State(state): State<AppState>,
) -> Json<Vec<Policy>> {
    let mut store = state.store.write().await;
    Json(store.policies_for(&owner, Utc::now()))
}

#[utoipa::path(
    get,
    path = "/v1/policies/{policy_id}",
    params(("policy_id" = String, Path, description = "Policy identifier")),
    tag = "Policies",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Policy),
        (status = 404, description = "No such policy for this caller")
    )
)]
pub async fn get_policy(
    Auth(caller): Auth,
    Path(policy_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Policy>, ApiError> {
    let mut store = state.store.write().await;
    let policy = store.policy(&policy_id, Utc::now())?;

    // Admins may inspect any policy; owners only their own. A foreign
    // policy reads as absent rather than forbidden.
    if policy.owner_address != caller && !state.auth.admin_addresses.contains(&caller) {
        return Err(ApiError::not_found("policy not found"));
    }
    Ok(Json(policy))
}

#[utoipa::path(
    post,
    path = "/v1/policies/{policy_id}/review",
    params(("policy_id" = String, Path, description = "Policy identifier")),
    request_body = ReviewRequest,
    tag = "Policies",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Policy),
        (status = 409, description = "Illegal transition for the current status")
    )
)]
pub async fn review_policy(
    AdminOnly(reviewer): AdminOnly,
    Path(policy_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Policy>, ApiError> {
    let mut store = state.store.write().await;
    let policy = store.review_policy(&policy_id, request.decision, request.note, Utc::now())?;
    tracing::info!(
        reviewer = %reviewer,
        policy_id = %policy.id,
        status = ?policy.status,
        "policy reviewed"
    );
    Ok(Json(policy))
}

#[utoipa::path(
    post,
    path = "/v1/policies/{policy_id}/payment",
    params(("policy_id" = String, Path, description = "Policy identifier")),
    request_body = PaymentEvidence,
    tag = "Policies",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Policy),
        (status = 409, description = "Policy is not awaiting payment"),
        (status = 422, description = "Evidence does not match the locked terms")
    )
)]
pub async fn confirm_payment(
    Auth(caller): Auth,
    Path(policy_id): Path<String>,
    State(state): State<AppState>,
    Json(evidence): Json<PaymentEvidence>,
) -> Result<Json<Policy>, ApiError> {
    let now = Utc::now();
    let mut store = state.store.write().await;

    // Ownership check and transition run under the same write guard.
    let existing = store.policy(&policy_id, now)?;
    if existing.owner_address != caller {
        return Err(ApiError::not_found("policy not found"));
    }

    let policy = store.confirm_payment(&policy_id, evidence, now)?;
    tracing::info!(owner = %caller, policy_id = %policy.id, "premium payment confirmed");
    Ok(Json(policy))
}

#[utoipa::path(
    get,
    path = "/v1/policies/{policy_id}/countdown",
    params(("policy_id" = String, Path, description = "Policy identifier")),
    tag = "Policies",
    responses(
        (status = 200, body = CountdownResponse),
        (status = 404, description = "No such policy")
    )
)]
pub async fn get_countdown(
    Path(policy_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CountdownResponse>, ApiError> {
    let now = Utc::now();
    let mut store = state.store.write().await;
    let policy = store.policy(&policy_id, now)?;
    Ok(Json(countdown(&policy, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreateProductRequest, PolicyStatus, Product, ReviewDecision, WalletAddress,
    };

    fn owner() -> WalletAddress {
        WalletAddress::from("0x00000000000000000000000000000000000000aa")
    }

    fn admin() -> WalletAddress {
        WalletAddress::from("0x00000000000000000000000000000000000000ad")
    }

    async fn seed_product(state: &AppState) -> Product {
        state.store.write().await.insert_product(CreateProductRequest {
            name: "Gold Cover".into(),
            chain_id: 43114,
            token_address: "0x00000000000000000000000000000000000000bb".into(),
            decimals: 6,
            premium_amount: "1000000".into(),
            coverage_amount: "50000000".into(),
            term_days: 90,
        })
    }

    fn matching_evidence(policy: &Policy) -> PaymentEvidence {
        PaymentEvidence {
            tx_hash: "0xdeadbeef".into(),
            chain_id: policy.chain_id,
            amount: policy.premium_amount.clone(),
            token: policy.token_address.clone(),
        }
    }

    #[tokio::test]
    async fn duplicate_policy_maps_to_conflict() {
        let state = AppState::default();
        let product = seed_product(&state).await;

        create_policy(
            Auth(owner()),
            State(state.clone()),
            Json(CreatePolicyRequest {
                sku_id: product.id.clone(),
            }),
        )
        .await
        .unwrap();

        let err = create_policy(
            Auth(owner()),
            State(state),
            Json(CreatePolicyRequest { sku_id: product.id }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.kind, "duplicate_active_policy");
    }

    #[tokio::test]
    async fn owner_cannot_read_foreign_policy() {
        let state = AppState::default();
        let product = seed_product(&state).await;
        let (_, Json(policy)) = create_policy(
            Auth(owner()),
            State(state.clone()),
            Json(CreatePolicyRequest { sku_id: product.id }),
        )
        .await
        .unwrap();

        let stranger = WalletAddress::from("0x00000000000000000000000000000000000000cc");
        let err = get_policy(Auth(stranger), Path(policy.id.clone()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // An admin can read it.
        let state = state.with_admin(admin());
        let Json(seen) = get_policy(Auth(admin()), Path(policy.id), State(state))
            .await
            .unwrap();
        assert_eq!(seen.owner_address, owner());
    }

    #[tokio::test]
    async fn payment_on_foreign_policy_reads_as_absent() {
        let state = AppState::default();
        let product = seed_product(&state).await;
        let (_, Json(policy)) = create_policy(
            Auth(owner()),
            State(state.clone()),
            Json(CreatePolicyRequest { sku_id: product.id }),
        )
        .await
        .unwrap();

        let stranger = WalletAddress::from("0x00000000000000000000000000000000000000cc");
        let err = confirm_payment(
            Auth(stranger),
            Path(policy.id.clone()),
            State(state),
            Json(matching_evidence(&policy)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_lifecycle_through_the_handlers() {
        let state = AppState::default().with_admin(admin());
        let product = seed_product(&state).await;

        let (status, Json(policy)) = create_policy(
            Auth(owner()),
            State(state.clone()),
            Json(CreatePolicyRequest { sku_id: product.id }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(policy.status, PolicyStatus::Pending);

        let Json(approved) = review_policy(
            AdminOnly(admin()),
            Path(policy.id.clone()),
            State(state.clone()),
            Json(ReviewRequest {
                decision: ReviewDecision::Approve,
                note: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(approved.status, PolicyStatus::ApprovedAwaitingPayment);

        let Json(active) = confirm_payment(
            Auth(owner()),
            Path(policy.id.clone()),
            State(state.clone()),
            Json(matching_evidence(&policy)),
        )
        .await
        .unwrap();
        assert_eq!(active.status, PolicyStatus::Active);
        assert!(active.start_at.is_some() && active.end_at.is_some());

        let Json(remaining) = get_countdown(Path(policy.id.clone()), State(state.clone()))
            .await
            .unwrap();
        // A moment has passed since activation, so the floor may land on 89.
        assert!((89..=90).contains(&remaining.days_remaining));
        assert!(remaining.seconds_remaining > 0);

        let Json(mine) = list_policies(Auth(owner()), State(state)).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, policy.id);
    }

    #[tokio::test]
    async fn mismatched_payment_maps_to_unprocessable() {
        let state = AppState::default().with_admin(admin());
        let product = seed_product(&state).await;
        let (_, Json(policy)) = create_policy(
            Auth(owner()),
            State(state.clone()),
            Json(CreatePolicyRequest { sku_id: product.id }),
        )
        .await
        .unwrap();
        review_policy(
            AdminOnly(admin()),
            Path(policy.id.clone()),
            State(state.clone()),
            Json(ReviewRequest {
                decision: ReviewDecision::Approve,
                note: None,
            }),
        )
        .await
        .unwrap();

        let mut evidence = matching_evidence(&policy);
        evidence.amount = "1".into();
        let err = confirm_payment(
            Auth(owner()),
            Path(policy.id.clone()),
            State(state.clone()),
            Json(evidence),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind, "payment_mismatch");

        // Status is unchanged after the failed confirmation.
        let Json(unchanged) = get_policy(Auth(owner()), Path(policy.id), State(state))
            .await
            .unwrap();
        assert_eq!(unchanged.status, PolicyStatus::ApprovedAwaitingPayment);
    }

    #[tokio::test]
    async fn countdown_for_unknown_policy_is_not_found() {
        let state = AppState::default();
        let err = get_countdown(Path("missing".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}

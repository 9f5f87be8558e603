// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Product catalog endpoints.
//!
//! Products are created by admins and are immutable afterwards; the policy
//! lifecycle only ever reads them.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{CreateProductRequest, Product},
    policy::MAX_TERM_DAYS,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Products",
    responses((status = 200, body = [Product]))
)]
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let store = state.store.read().await;
    Json(store.list_active_products())
}

#[utoipa::path(
    post,
    path = "/v1/admin/products",
    request_body = CreateProductRequest,
    tag = "Products",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Product),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn create_product(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    if request.term_days <= 0 || request.term_days > MAX_TERM_DAYS {
        return Err(ApiError::bad_request(format!(
            "term_days must be between 1 and {MAX_TERM_DAYS}"
        )));
    }
    if request.premium_amount.trim().is_empty() || request.coverage_amount.trim().is_empty() {
        return Err(ApiError::bad_request(
            "premium_amount and coverage_amount are required",
        ));
    }

    let mut store = state.store.write().await;
    let product = store.insert_product(request);
    tracing::info!(admin = %admin, product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

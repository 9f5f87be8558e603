// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        ChallengeRequest, ChallengeResponse, CountdownResponse, CreatePolicyRequest,
        CreateProductRequest, Payment, PaymentEvidence, Policy, PolicyStatus, Product,
        ProductStatus, ReviewDecision, ReviewRequest, ReviewStatsResponse, VerifyRequest,
        VerifyResponse, WalletAddress, WhoamiResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod policies;
pub mod products;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/challenge", post(auth::request_challenge))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/whoami", get(auth::whoami))
        .route("/products", get(products::list_products))
        .route("/admin/products", post(products::create_product))
        .route("/admin/stats", get(admin::review_stats))
        .route(
            "/policies",
            get(policies::list_policies).post(policies::create_policy),
        )
        .route("/policies/{policy_id}", get(policies::get_policy))
        .route("/policies/{policy_id}/review", post(policies::review_policy))
        .route(
            "/policies/{policy_id}/payment",
            post(policies::confirm_payment),
        )
        .route("/policies/{policy_id}/countdown", get(policies::get_countdown))
        .route("/health", get(health::health))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_challenge,
        auth::verify,
        auth::whoami,
        products::list_products,
        products::create_product,
        admin::review_stats,
        policies::create_policy,
        policies::list_policies,
        policies::get_policy,
        policies::review_policy,
        policies::confirm_payment,
        policies::get_countdown,
        health::health
    ),
    components(
        schemas(
            WalletAddress,
            ChallengeRequest,
            ChallengeResponse,
            VerifyRequest,
            VerifyResponse,
            WhoamiResponse,
            Product,
            ProductStatus,
            CreateProductRequest,
            Policy,
            PolicyStatus,
            CreatePolicyRequest,
            ReviewDecision,
            ReviewRequest,
            Payment,
            PaymentEvidence,
            CountdownResponse,
            ReviewStatsResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Wallet challenge-response sign-in"),
        (name = "Products", description = "Insurance product catalog"),
        (name = "Policies", description = "Policy lifecycle"),
        (name = "Admin", description = "Administrative reporting"),
        (name = "Health", description = "Liveness probes")
    )
)]
struct ApiDoc;

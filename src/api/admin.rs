// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only reporting endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{auth::AdminOnly, error::ApiError, models::ReviewStatsResponse, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Start of the reporting window. The caller supplies its own UTC
    /// midnight; timezone policy stays out of the core.
    pub since: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    params(StatsQuery),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ReviewStatsResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn review_stats(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ReviewStatsResponse>, ApiError> {
    let store = state.store.read().await;
    let (approved, rejected) = store.review_stats(query.since);
    Ok(Json(ReviewStatsResponse {
        since: query.since,
        approved,
        rejected,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProductRequest, ReviewDecision, WalletAddress};
    use chrono::Duration;

    #[tokio::test]
    async fn stats_count_decisions_in_the_window() {
        let state = AppState::default();
        let owner = WalletAddress::from("0x00000000000000000000000000000000000000aa");
        let day_start = Utc::now() - Duration::hours(1);

        {
            let mut store = state.store.write().await;
            let product = store.insert_product(CreateProductRequest {
                name: "Gold Cover".into(),
                chain_id: 43114,
                token_address: "0x00000000000000000000000000000000000000bb".into(),
                decimals: 6,
                premium_amount: "1000000".into(),
                coverage_amount: "50000000".into(),
                term_days: 90,
            });
            let policy = store.create_policy(&owner, &product.id, Utc::now()).unwrap();
            store
                .review_policy(&policy.id, ReviewDecision::Approve, None, Utc::now())
                .unwrap();
        }

        let admin = WalletAddress::from("0x00000000000000000000000000000000000000ad");
        let Json(stats) = review_stats(
            AdminOnly(admin),
            State(state),
            Query(StatsQuery { since: day_start }),
        )
        .await
        .unwrap();
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 0);
    }
}

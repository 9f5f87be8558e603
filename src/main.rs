// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashSet;
use std::env;
use std::net::SocketAddr;

use rand::RngCore;
use tracing_subscriber::EnvFilter;

use relational_cover_server::api::router;
use relational_cover_server::config::{
    ADMIN_ADDRESSES_ENV, HOST_ENV, LOG_FORMAT_ENV, PORT_ENV, SESSION_SECRET_ENV, SIWE_DOMAIN_ENV,
};
use relational_cover_server::models::WalletAddress;
use relational_cover_server::state::{AppState, AuthSettings};

#[tokio::main]
async fn main() {
    init_tracing();

    let secret = session_secret();
    let auth = AuthSettings {
        domain: env::var(SIWE_DOMAIN_ENV).unwrap_or_else(|_| "cover.example.org".to_string()),
        admin_addresses: admin_addresses(),
    };
    tracing::info!(
        domain = %auth.domain,
        admins = auth.admin_addresses.len(),
        "starting policy issuance server"
    );

    let app = router(AppState::new(&secret, auth));

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var(PORT_ENV).unwrap_or_else(|_| "8080".to_string());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("invalid HOST/PORT configuration");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!("listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn session_secret() -> Vec<u8> {
    match env::var(SESSION_SECRET_ENV) {
        Ok(secret) if !secret.trim().is_empty() => secret.into_bytes(),
        _ => {
            tracing::warn!(
                "{SESSION_SECRET_ENV} not set; sessions will not survive a restart"
            );
            let mut secret = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            secret
        }
    }
}

fn admin_addresses() -> HashSet<WalletAddress> {
    env::var(ADMIN_ADDRESSES_ENV)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(WalletAddress::from)
                .collect()
        })
        .unwrap_or_default()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

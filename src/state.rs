// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashSet;
use std::sync::Arc;

use rand::RngCore;
use tokio::sync::RwLock;

use crate::auth::{NonceStore, SessionIssuer};
use crate::models::WalletAddress;
use crate::policy::PolicyStore;

/// Authentication settings shared by handlers and extractors.
pub struct AuthSettings {
    /// Domain the challenge messages must bind to.
    pub domain: String,
    /// Wallet addresses allowed to use administrative endpoints.
    pub admin_addresses: HashSet<WalletAddress>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            domain: "cover.example.org".to_string(),
            admin_addresses: HashSet::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<PolicyStore>>,
    pub nonces: Arc<NonceStore>,
    pub sessions: Arc<SessionIssuer>,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(session_secret: &[u8], auth: AuthSettings) -> Self {
        Self {
            store: Arc::new(RwLock::new(PolicyStore::new())),
            nonces: Arc::new(NonceStore::new()),
            sessions: Arc::new(SessionIssuer::new(session_secret)),
            auth: Arc::new(auth),
        }
    }

    /// Register an additional admin address (startup/tests only; `AuthSettings`
    /// is immutable once the state is shared).
    pub fn with_admin(mut self, address: WalletAddress) -> Self {
        let mut auth = AuthSettings {
            domain: self.auth.domain.clone(),
            admin_addresses: self.auth.admin_addresses.clone(),
        };
        auth.admin_addresses.insert(address);
        self.auth = Arc::new(auth);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        // Fresh random secret per instance; fine for tests and for
        // single-process deployments without SESSION_SECRET set.
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(&secret, AuthSettings::default())
    }
}

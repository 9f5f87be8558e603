// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use challenge nonces.
//!
//! At most one unconsumed, unexpired nonce exists per address: issuing a new
//! nonce overwrites any prior one. Consumption is a single check-and-set
//! under the store's mutex, so two concurrent consume calls for the same
//! nonce yield exactly one success.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::models::WalletAddress;

/// Nonce time-to-live.
pub const NONCE_TTL_MINUTES: i64 = 10;

/// Length of the generated alphanumeric nonce token.
const NONCE_LENGTH: usize = 32;

/// A challenge nonce bound to one wallet address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    pub address: WalletAddress,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

/// Why a consume attempt failed.
///
/// Never returned to the client directly; the verifier logs the variant and
/// surfaces the uniform authentication-failure signal instead.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    #[error("no nonce issued for this address")]
    NotFound,
    #[error("nonce has expired")]
    Expired,
    #[error("nonce was already consumed")]
    AlreadyConsumed,
    #[error("supplied nonce does not match the issued one")]
    Mismatch,
}

/// In-memory nonce table keyed by normalized address.
#[derive(Default)]
pub struct NonceStore {
    records: Mutex<HashMap<String, NonceRecord>>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh nonce for an address.
    ///
    /// Overwrites any prior unconsumed record for the address, so only the
    /// most recently issued nonce ever verifies. Expired records for other
    /// addresses are purged opportunistically while the lock is held.
    pub fn issue(&self, address: &WalletAddress, now: DateTime<Utc>) -> NonceRecord {
        let record = NonceRecord {
            address: address.clone(),
            nonce: generate_nonce(),
            issued_at: now,
            expires_at: now + Duration::minutes(NONCE_TTL_MINUTES),
            consumed: false,
        };

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.retain(|_, existing| existing.expires_at > now);
        records.insert(address.as_str().to_string(), record.clone());
        record
    }

    /// Consume a nonce, exactly once.
    ///
    /// Fails unless a record exists for the address, matches the supplied
    /// token, is unexpired, and has not been consumed. On success the record
    /// is marked consumed within the same critical section.
    pub fn consume(
        &self,
        address: &WalletAddress,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<(), NonceError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .get_mut(address.as_str())
            .ok_or(NonceError::NotFound)?;

        if record.nonce != nonce {
            return Err(NonceError::Mismatch);
        }
        if record.consumed {
            return Err(NonceError::AlreadyConsumed);
        }
        if now >= record.expires_at {
            return Err(NonceError::Expired);
        }

        record.consumed = true;
        Ok(())
    }
}

/// High-entropy alphanumeric token.
fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr() -> WalletAddress {
        WalletAddress::from("0x00000000000000000000000000000000000000aa")
    }

    #[test]
    fn issued_nonce_is_alphanumeric_and_long_enough() {
        let store = NonceStore::new();
        let record = store.issue(&addr(), Utc::now());
        assert_eq!(record.nonce.len(), NONCE_LENGTH);
        assert!(record.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!record.consumed);
    }

    #[test]
    fn consume_succeeds_exactly_once() {
        let store = NonceStore::new();
        let now = Utc::now();
        let record = store.issue(&addr(), now);

        assert_eq!(store.consume(&addr(), &record.nonce, now), Ok(()));
        assert_eq!(
            store.consume(&addr(), &record.nonce, now),
            Err(NonceError::AlreadyConsumed)
        );
    }

    #[test]
    fn unknown_address_and_wrong_token_fail() {
        let store = NonceStore::new();
        let now = Utc::now();
        assert_eq!(
            store.consume(&addr(), "anything", now),
            Err(NonceError::NotFound)
        );

        store.issue(&addr(), now);
        assert_eq!(
            store.consume(&addr(), "not-the-nonce", now),
            Err(NonceError::Mismatch)
        );
    }

    #[test]
    fn expired_nonce_is_refused() {
        let store = NonceStore::new();
        let now = Utc::now();
        let record = store.issue(&addr(), now);

        let later = now + Duration::minutes(NONCE_TTL_MINUTES);
        assert_eq!(
            store.consume(&addr(), &record.nonce, later),
            Err(NonceError::Expired)
        );
    }

    #[test]
    fn reissue_invalidates_the_previous_nonce() {
        let store = NonceStore::new();
        let now = Utc::now();
        let first = store.issue(&addr(), now);
        let second = store.issue(&addr(), now);

        assert_eq!(
            store.consume(&addr(), &first.nonce, now),
            Err(NonceError::Mismatch)
        );
        assert_eq!(store.consume(&addr(), &second.nonce, now), Ok(()));
    }

    #[test]
    fn concurrent_consume_has_a_single_winner() {
        let store = Arc::new(NonceStore::new());
        let now = Utc::now();
        let record = store.issue(&addr(), now);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let nonce = record.nonce.clone();
                std::thread::spawn(move || store.consume(&addr(), &nonce, now).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().expect("consumer thread panicked"))
            .filter(|won| *won)
            .count();
        assert_eq!(successes, 1);
    }
}

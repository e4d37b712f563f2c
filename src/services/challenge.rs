//! In-memory store for login verification challenges.
//!
//! One challenge may be outstanding per email; issuing a new one overwrites
//! any prior unconsumed code. A successful verification consumes the entry
//! (single-use). A mismatched code leaves the entry in place so the user can
//! retry. Entries expire after a fixed lifetime and are purged lazily.

use dashmap::DashMap;
use rand::Rng;
use std::time::{Duration, Instant};

struct PendingChallenge {
    code: String,
    issued_at: Instant,
}

impl PendingChallenge {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() > ttl
    }
}

/// Process-wide challenge map, keyed by account email.
pub struct ChallengeStore {
    entries: DashMap<String, PendingChallenge>,
    ttl: Duration,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    /// No live challenge for the email, or the code does not match.
    #[error("invalid verification code")]
    InvalidCode,
}

impl ChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh 6-digit code for `email`, replacing any outstanding one.
    pub fn issue(&self, email: &str) -> String {
        let code = generate_code();
        self.entries.insert(
            email.to_string(),
            PendingChallenge {
                code: code.clone(),
                issued_at: Instant::now(),
            },
        );
        code
    }

    /// Consume the challenge for `email` if `code` matches and is still live.
    pub fn verify_and_consume(&self, email: &str, code: &str) -> Result<(), ChallengeError> {
        let consumed = self
            .entries
            .remove_if(email, |_, pending| {
                pending.code == code && !pending.is_expired(self.ttl)
            })
            .is_some();

        if consumed {
            return Ok(());
        }

        // Expired entries behave as absent and are dropped here.
        self.entries
            .remove_if(email, |_, pending| pending.is_expired(self.ttl));
        Err(ChallengeError::InvalidCode)
    }
}

/// Uniform draw over the six-digit range.
fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ChallengeStore {
        ChallengeStore::new(Duration::from_secs(600))
    }

    #[test]
    fn codes_are_six_digit_numeric() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn code_verifies_exactly_once() {
        let store = store();
        let code = store.issue("user@example.com");

        assert_eq!(store.verify_and_consume("user@example.com", &code), Ok(()));
        assert_eq!(
            store.verify_and_consume("user@example.com", &code),
            Err(ChallengeError::InvalidCode)
        );
    }

    #[test]
    fn reissue_invalidates_prior_code() {
        let store = store();
        let first = store.issue("user@example.com");
        let second = store.issue("user@example.com");

        // Codes can collide by chance; only meaningful when distinct.
        if first != second {
            assert_eq!(
                store.verify_and_consume("user@example.com", &first),
                Err(ChallengeError::InvalidCode)
            );
        }
        assert_eq!(store.verify_and_consume("user@example.com", &second), Ok(()));
    }

    #[test]
    fn mismatch_leaves_challenge_for_retry() {
        let store = store();
        let code = store.issue("user@example.com");

        assert_eq!(
            store.verify_and_consume("user@example.com", "000000"),
            Err(ChallengeError::InvalidCode)
        );
        assert_eq!(store.verify_and_consume("user@example.com", &code), Ok(()));
    }

    #[test]
    fn unknown_email_is_rejected() {
        let store = store();
        assert_eq!(
            store.verify_and_consume("nobody@example.com", "123456"),
            Err(ChallengeError::InvalidCode)
        );
    }

    #[test]
    fn expired_challenge_is_rejected_and_purged() {
        let store = ChallengeStore::new(Duration::ZERO);
        let code = store.issue("user@example.com");
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(
            store.verify_and_consume("user@example.com", &code),
            Err(ChallengeError::InvalidCode)
        );
        assert!(store.entries.is_empty());
    }
}

use thiserror::Error;

use super::crypto::hash_block;
use super::transaction::Transaction;

/// Leading hex characters every mined block hash must start with
pub const DIFFICULTY_PREFIX: &str = "0000";

/// Errors that can occur during the nonce search
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("No valid nonce found within {0} attempts")]
    AttemptsExhausted(u64),
}

/// A nonce accepted by the difficulty target, with the hash it produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub hash: String,
}

/// Nonce search over `hash_block`
///
/// The default search is unbounded and runs on the calling thread until it
/// finds the smallest accepted nonce.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    /// Required hash prefix
    target: String,

    /// Optional cap on the number of nonces tried
    max_attempts: Option<u64>,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork {
            target: DIFFICULTY_PREFIX.to_string(),
            max_attempts: None,
        }
    }
}

impl ProofOfWork {
    /// Limits the search to `max_attempts` nonces (0 through `max_attempts - 1`)
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    #[cfg(test)]
    fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Stop condition of the search
    pub fn meets_target(&self, hash: &str) -> bool {
        hash.starts_with(&self.target)
    }

    /// Searches nonces 0, 1, 2, ... for the first one whose hash meets the target
    ///
    /// # Arguments
    ///
    /// * `previous_hash` - The hash of the block being extended
    /// * `transactions` - The transactions of the candidate block
    ///
    /// # Returns
    ///
    /// The smallest accepted nonce and its hash, or `AttemptsExhausted` when a
    /// budget is set and runs out
    pub fn search(
        &self,
        previous_hash: &str,
        transactions: &[Transaction],
    ) -> Result<Solution, MiningError> {
        let mut nonce = 0u64;

        loop {
            if let Some(max_attempts) = self.max_attempts {
                if nonce >= max_attempts {
                    return Err(MiningError::AttemptsExhausted(max_attempts));
                }
            }

            let hash = hash_block(previous_hash, transactions, nonce);
            if self.meets_target(&hash) {
                return Ok(Solution { nonce, hash });
            }

            nonce += 1;
        }
    }

    /// Checks that `nonce` reproduces `hash` and that the hash meets the target
    pub fn verify(
        &self,
        previous_hash: &str,
        transactions: &[Transaction],
        nonce: u64,
        hash: &str,
    ) -> bool {
        self.meets_target(hash) && hash_block(previous_hash, transactions, nonce) == hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transactions() -> Vec<Transaction> {
        vec![Transaction::new(50, "x", "y")]
    }

    #[test]
    fn test_search_finds_prefixed_hash() {
        let transactions = sample_transactions();
        let solution = ProofOfWork::default().search("0", &transactions).unwrap();

        assert!(solution.hash.starts_with(DIFFICULTY_PREFIX));
        assert_eq!(solution.hash, hash_block("0", &transactions, solution.nonce));
    }

    #[test]
    fn test_search_returns_smallest_nonce() {
        let transactions = sample_transactions();
        let pow = ProofOfWork::default();
        let solution = pow.search("previous", &transactions).unwrap();

        for nonce in 0..solution.nonce {
            let hash = hash_block("previous", &transactions, nonce);
            assert!(!pow.meets_target(&hash), "nonce {} also meets the target", nonce);
        }
    }

    #[test]
    fn test_search_with_empty_transactions() {
        let solution = ProofOfWork::default().search("abc", &[]).unwrap();
        assert!(solution.hash.starts_with(DIFFICULTY_PREFIX));
    }

    #[test]
    fn test_budget_exhausted() {
        // An all-zero hash is practically unreachable
        let pow = ProofOfWork::default()
            .with_target(&"0".repeat(64))
            .with_max_attempts(100);

        let result = pow.search("0", &sample_transactions());
        assert!(matches!(result, Err(MiningError::AttemptsExhausted(100))));
    }

    #[test]
    fn test_budget_large_enough_succeeds() {
        let transactions = sample_transactions();
        let unbounded = ProofOfWork::default().with_target("0").search("0", &transactions).unwrap();

        let bounded = ProofOfWork::default()
            .with_target("0")
            .with_max_attempts(unbounded.nonce + 1)
            .search("0", &transactions)
            .unwrap();

        assert_eq!(bounded, unbounded);
    }

    #[test]
    fn test_verify() {
        let transactions = sample_transactions();
        let pow = ProofOfWork::default();
        let solution = pow.search("0", &transactions).unwrap();

        assert!(pow.verify("0", &transactions, solution.nonce, &solution.hash));
        assert!(!pow.verify("1", &transactions, solution.nonce, &solution.hash));
        assert!(!pow.verify("0", &[], solution.nonce, &solution.hash));
    }
}

use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// Computes the SHA-256 digest of a string as lowercase hex
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes a block candidate
///
/// The digest covers `previous_hash`, the decimal nonce and the compact JSON
/// encoding of the transactions, concatenated in that order. Two equal
/// transaction lists always serialize to the same bytes, so any peer can
/// recompute the hash of a block it receives.
///
/// # Arguments
///
/// * `previous_hash` - The hash of the block this candidate links to
/// * `transactions` - The transactions the candidate carries
/// * `nonce` - The proof-of-work nonce
///
/// # Returns
///
/// A 64-character hexadecimal string
pub fn hash_block(previous_hash: &str, transactions: &[Transaction], nonce: u64) -> String {
    let transactions_json = serde_json::to_string(transactions)
        .expect("transaction serialization should not fail");

    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(transactions_json.as_bytes());
    hex::encode(hasher.finalize())
}

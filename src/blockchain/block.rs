use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Linkage and hash value carried by the genesis block
pub const GENESIS_HASH: &str = "0";

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// 1-based position of the block in the chain
    pub index: u64,

    /// Creation time in nanoseconds since the Unix epoch
    pub timestamp: i64,

    /// Transactions absorbed from the pending pool, in submission order
    pub transactions: Vec<Transaction>,

    /// Proof of work nonce
    pub nonce: u64,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Hash of this block
    pub hash: String,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to include in the block
    /// * `nonce` - The proof of work nonce
    /// * `previous_hash` - The hash of the previous block
    /// * `hash` - The hash found for this block
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        nonce: u64,
        previous_hash: String,
        hash: String,
    ) -> Self {
        Block {
            index,
            timestamp: now_nanos(),
            transactions,
            nonce,
            previous_hash,
            hash,
        }
    }

    /// Creates the genesis block
    ///
    /// It carries a single zero-amount placeholder transaction and is never
    /// checked against the difficulty target.
    pub fn genesis() -> Self {
        Block::new(
            1,
            vec![Transaction::new(0, "Satoshi", "Nakamoto")],
            0,
            GENESIS_HASH.to_string(),
            GENESIS_HASH.to_string(),
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_HASH
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert_eq!(genesis.index, 1);
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.hash, "0");
        assert_eq!(genesis.transactions.len(), 1);
        assert_eq!(genesis.transactions[0].amount, 0);
        assert!(genesis.is_genesis());
    }

    #[test]
    fn test_new_block() {
        let transactions = vec![Transaction::new(10, "a", "b")];
        let block = Block::new(2, transactions.clone(), 100, "prev".to_string(), "hash".to_string());

        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, transactions);
        assert_eq!(block.nonce, 100);
        assert_eq!(block.previous_hash, "prev");
        assert!(block.timestamp > 0);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_block_json_field_names() {
        let block = Block::new(2, Vec::new(), 7, "prev".to_string(), "hash".to_string());
        let value = serde_json::to_value(&block).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["hash", "index", "nonce", "previousHash", "timestamp", "transactions"]
        );
        assert_eq!(value["previousHash"], "prev");
    }
}

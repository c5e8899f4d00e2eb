use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sender recorded on mining reward transactions
pub const REWARD_SENDER: &str = "00";

/// Amount credited to the local node for each mined block
pub const MINING_REWARD: i64 = 3;

/// Represents a transfer between two opaque identifiers
///
/// Field order is part of the hashing contract: transactions serialize as
/// `amount`, `sender`, `recipient` and that JSON is what the block hash covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Amount being transferred (no sign or balance checks are applied)
    pub amount: i64,

    /// Sender's identifier
    pub sender: String,

    /// Recipient's identifier
    pub recipient: String,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to transfer
    /// * `sender` - The sender's identifier
    /// * `recipient` - The recipient's identifier
    pub fn new(amount: i64, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Transaction {
            amount,
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    /// Creates the reward transaction credited to a mining node
    pub fn new_reward(node_address: impl Into<String>) -> Self {
        Transaction::new(MINING_REWARD, REWARD_SENDER, node_address)
    }

    /// Checks if the transaction is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

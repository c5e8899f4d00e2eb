use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::block::Block;
use super::peers::PeerRegistry;
use super::pow::{MiningError, ProofOfWork};
use super::transaction::Transaction;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Mining error: {0}")]
    MiningError(#[from] MiningError),
}

/// Read-only copy of the ledger state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Transactions waiting for the next block
    pub pending_transactions: Vec<Transaction>,

    /// Known peer addresses
    pub network_nodes: Vec<String>,
}

/// Represents the blockchain
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks
    chain: Arc<Mutex<Vec<Block>>>,

    /// Pending transactions to be included in the next block
    pending_transactions: Arc<Mutex<Vec<Transaction>>>,

    /// Held for the whole of a mine so two mines never absorb the same pool
    mining: Arc<Mutex<()>>,

    /// Nonce search used for new blocks
    proof_of_work: ProofOfWork,

    /// Identity credited with mining rewards
    node_address: String,

    /// Known peers
    peers: PeerRegistry,
}

/// Locks a mutex, recovering the data if a holder panicked
///
/// No critical section in this module leaves a partial update behind.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `node_address` - The identity credited with mining rewards
    /// * `node_url` - The public URL of this node
    pub fn new(node_address: impl Into<String>, node_url: impl Into<String>) -> Self {
        Blockchain {
            chain: Arc::new(Mutex::new(vec![Block::genesis()])),
            pending_transactions: Arc::new(Mutex::new(Vec::new())),
            mining: Arc::new(Mutex::new(())),
            proof_of_work: ProofOfWork::default(),
            node_address: node_address.into(),
            peers: PeerRegistry::new(Some(node_url.into())),
        }
    }

    /// Replaces the nonce search, e.g. to give it an attempt budget
    pub fn with_proof_of_work(mut self, proof_of_work: ProofOfWork) -> Self {
        self.proof_of_work = proof_of_work;
        self
    }

    pub fn node_address(&self) -> &str {
        &self.node_address
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Block {
        let chain = lock(&self.chain);
        // The chain always holds at least the genesis block
        chain[chain.len() - 1].clone()
    }

    /// Adds a new transaction to the pending transactions
    ///
    /// No validation is performed on the amount or the parties.
    ///
    /// # Returns
    ///
    /// The index of the block that will most likely include the transaction.
    /// A mine running concurrently can make it land one block later.
    pub fn submit_transaction(
        &self,
        amount: i64,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> u64 {
        let transaction = Transaction::new(amount, sender, recipient);
        debug!(
            "Queued transaction of {} from {} to {}",
            transaction.amount, transaction.sender, transaction.recipient
        );

        lock(&self.pending_transactions).push(transaction);

        self.last_block().index + 1
    }

    /// Mines a new block with the pending transactions
    ///
    /// The pool is copied, the nonce search runs without holding the chain or
    /// pool locks, and the block is then committed: the copied transactions
    /// leave the pool, the reward for this node is queued for the next block,
    /// and the block is appended. Transactions submitted during the search
    /// stay pending.
    ///
    /// # Returns
    ///
    /// Result with the newly mined block
    pub fn mine(&self) -> Result<Block, BlockchainError> {
        let _mining = lock(&self.mining);

        let last_block = self.last_block();
        let transactions = lock(&self.pending_transactions).clone();

        let solution = self.proof_of_work.search(&last_block.hash, &transactions)?;

        let block = Block::new(
            last_block.index + 1,
            transactions,
            solution.nonce,
            last_block.hash,
            solution.hash,
        );

        {
            let mut chain = lock(&self.chain);
            let mut pending = lock(&self.pending_transactions);

            pending.drain(..block.transactions.len());
            pending.push(Transaction::new_reward(self.node_address.as_str()));
            chain.push(block.clone());
        }

        info!(
            "Mined block {} with {} transactions (nonce {}, hash {})",
            block.index,
            block.transactions.len(),
            block.nonce,
            block.hash
        );

        Ok(block)
    }

    /// Gets the entire blockchain
    pub fn get_chain(&self) -> Vec<Block> {
        lock(&self.chain).clone()
    }

    /// Gets all pending transactions
    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        lock(&self.pending_transactions).clone()
    }

    /// Copies the chain, the pending pool and the known peers
    pub fn snapshot(&self) -> LedgerSnapshot {
        let (chain, pending_transactions) = {
            let chain = lock(&self.chain);
            let pending = lock(&self.pending_transactions);
            (chain.clone(), pending.clone())
        };

        LedgerSnapshot {
            chain,
            pending_transactions,
            network_nodes: self.peers.nodes(),
        }
    }

    /// Validates the blockchain
    ///
    /// Checks that the chain starts with the genesis block, that indices
    /// increase by one, that every block links to its predecessor's hash, and
    /// that every mined block's hash is reproducible and meets the target.
    pub fn is_valid(&self) -> bool {
        let chain = lock(&self.chain);

        if !chain.first().map_or(false, Block::is_genesis) {
            return false;
        }

        chain.windows(2).all(|pair| {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            current_block.index == previous_block.index + 1
                && current_block.previous_hash == previous_block.hash
                && self.proof_of_work.verify(
                    &current_block.previous_hash,
                    &current_block.transactions,
                    current_block.nonce,
                    &current_block.hash,
                )
        })
    }
}

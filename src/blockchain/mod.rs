// Blockchain module
//
// This module contains the core ledger implementation including:
// - Block and transaction structures
// - Block hashing and the proof of work search
// - The blockchain aggregate (chain and pending pool)
// - The peer registry and its HTTP transport

pub mod block;
pub mod chain;
pub mod client;
pub mod crypto;
pub mod peers;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, LedgerSnapshot};
pub use client::{HttpPeerClient, RegisterNodeRequest, RegisterNodesBulkRequest};
pub use peers::{BroadcastReport, PeerClient, PeerError, PeerOutcome};
pub use pow::ProofOfWork;
pub use transaction::Transaction;

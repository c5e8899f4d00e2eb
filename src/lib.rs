//! Proof-of-work ledger node with gossip-style peer registration.
//!
//! The [`blockchain`] module holds the ledger engine, [`api`] maps it onto
//! HTTP and [`config`] resolves the node's command-line settings.

pub mod api;
pub mod blockchain;
pub mod config;

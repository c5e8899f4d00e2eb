use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Errors that can occur during peer registration
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Node {0} is already registered in the network")]
    AlreadyRegistered(String),

    #[error("Invalid node address: {0:?}")]
    InvalidAddress(String),

    #[error("Could not reach node {peer}: {message}")]
    Transport { peer: String, message: String },

    #[error("Node {0} did not answer in time")]
    Timeout(String),

    #[error("Node {peer} rejected the request with status {status}")]
    Rejected { peer: String, status: u16 },
}

/// Transport used to deliver registration calls to other nodes
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Asks `peer_url` to record `new_node_url`
    async fn register_node(&self, peer_url: &str, new_node_url: &str) -> Result<(), PeerError>;

    /// Asks `peer_url` to record every address in `node_urls`
    async fn register_nodes_bulk(&self, peer_url: &str, node_urls: &[String])
        -> Result<(), PeerError>;
}

/// Result of a single call made during a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PeerOutcome {
    /// The node that was called
    pub peer: String,

    /// Whether the call succeeded
    pub delivered: bool,

    /// Why the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PeerOutcome {
    fn from_result(peer: &str, action: &str, result: Result<(), PeerError>) -> Self {
        match result {
            Ok(()) => {
                info!("{} delivered to node {}", action, peer);
                PeerOutcome {
                    peer: peer.to_string(),
                    delivered: true,
                    error: None,
                }
            }
            Err(err) => {
                warn!("{} failed for node {}: {}", action, peer, err);
                PeerOutcome {
                    peer: peer.to_string(),
                    delivered: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// What happened while broadcasting a new node to the network
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    /// The node that was registered
    pub new_node_url: String,

    /// One outcome per previously known node
    pub notified: Vec<PeerOutcome>,

    /// Outcome of sending the network listing back to the new node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk: Option<PeerOutcome>,

    /// The listing sent to the new node
    pub all_network_nodes: Vec<String>,
}

/// Set of known peer addresses
///
/// Addresses are compared by exact string equality. The node's own URL is
/// never recorded, so a listing that contains it cannot make a node
/// register itself.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    /// Public URL of this node
    own_url: Option<String>,

    /// Known peer addresses
    nodes: Arc<DashSet<String>>,
}

impl PeerRegistry {
    /// Creates an empty registry
    ///
    /// # Arguments
    ///
    /// * `own_url` - The public URL of this node, if known
    pub fn new(own_url: Option<String>) -> Self {
        PeerRegistry {
            own_url,
            nodes: Arc::new(DashSet::new()),
        }
    }

    pub fn own_url(&self) -> Option<&str> {
        self.own_url.as_deref()
    }

    /// Gets the known peers, sorted
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.nodes.iter().map(|node| node.key().clone()).collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn contains(&self, node_url: &str) -> bool {
        self.nodes.contains(node_url)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn is_own_url(&self, node_url: &str) -> bool {
        self.own_url.as_deref() == Some(node_url)
    }

    fn check_address(node_url: &str) -> Result<(), PeerError> {
        if node_url.trim().is_empty() {
            return Err(PeerError::InvalidAddress(node_url.to_string()));
        }
        Ok(())
    }

    /// Records a node submitted by a client
    ///
    /// Registering a known node (or this node itself) is reported as
    /// `AlreadyRegistered` and leaves the set unchanged.
    pub fn register_local(&self, node_url: &str) -> Result<(), PeerError> {
        Self::check_address(node_url)?;

        if self.is_own_url(node_url) || !self.nodes.insert(node_url.to_string()) {
            warn!("Node {} is already registered", node_url);
            return Err(PeerError::AlreadyRegistered(node_url.to_string()));
        }

        info!("Successfully registered node {} locally", node_url);
        Ok(())
    }

    /// Records a node announced by another node's broadcast
    ///
    /// Idempotent: returns whether the node was newly added.
    pub fn register_remote(&self, node_url: &str) -> Result<bool, PeerError> {
        Self::check_address(node_url)?;

        if self.is_own_url(node_url) {
            return Ok(false);
        }

        let added = self.nodes.insert(node_url.to_string());
        if added {
            info!("Registered node {} announced by the network", node_url);
        }
        Ok(added)
    }

    /// Merges a batch of addresses into the set
    ///
    /// Known addresses, this node's own URL and blank entries are skipped.
    ///
    /// # Returns
    ///
    /// The number of newly added addresses
    pub fn register_bulk(&self, node_urls: &[String]) -> usize {
        let added = node_urls
            .iter()
            .filter(|node_url| Self::check_address(node_url).is_ok())
            .filter(|node_url| !self.is_own_url(node_url))
            .filter(|node_url| self.nodes.insert(node_url.to_string()))
            .count();

        info!(
            "Bulk registration added {} of {} nodes",
            added,
            node_urls.len()
        );
        added
    }

    /// Registers a node and announces it to the rest of the network
    ///
    /// Every previously known node is called concurrently and the call
    /// waits for all of them. Afterwards the new node receives the listing of
    /// all other known nodes (plus this node) so it can populate its own
    /// registry. A failed call is logged and recorded in the report; it never
    /// fails the registration and the peer stays registered.
    ///
    /// # Arguments
    ///
    /// * `new_node_url` - The node to register
    /// * `client` - Transport for the calls to other nodes
    ///
    /// # Returns
    ///
    /// A report of every call made, or `AlreadyRegistered`/`InvalidAddress`
    /// when nothing was broadcast
    pub async fn register_and_broadcast(
        &self,
        new_node_url: &str,
        client: &dyn PeerClient,
    ) -> Result<BroadcastReport, PeerError> {
        self.register_local(new_node_url)?;

        let targets: Vec<String> = self
            .nodes()
            .into_iter()
            .filter(|node| node != new_node_url)
            .collect();

        let notified = join_all(targets.iter().map(|peer| async move {
            let result = client.register_node(peer, new_node_url).await;
            PeerOutcome::from_result(peer, "register-node", result)
        }))
        .await;

        let mut all_network_nodes: Vec<String> = self
            .nodes()
            .into_iter()
            .filter(|node| node != new_node_url)
            .collect();
        if let Some(own_url) = &self.own_url {
            all_network_nodes.push(own_url.clone());
        }

        let bulk = if all_network_nodes.is_empty() {
            None
        } else {
            let result = client
                .register_nodes_bulk(new_node_url, &all_network_nodes)
                .await;
            Some(PeerOutcome::from_result(
                new_node_url,
                "register-nodes-bulk",
                result,
            ))
        };

        let failures = notified.iter().filter(|outcome| !outcome.delivered).count();
        info!(
            "Broadcast of node {} finished: {} notified, {} failed",
            new_node_url,
            notified.len() - failures,
            failures
        );

        Ok(BroadcastReport {
            new_node_url: new_node_url.to_string(),
            notified,
            bulk,
            all_network_nodes,
        })
    }
}

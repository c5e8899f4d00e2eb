use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{
    Block, Blockchain, BroadcastReport, LedgerSnapshot, PeerClient, PeerError,
    RegisterNodeRequest, RegisterNodesBulkRequest, Transaction,
};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Transport used to reach other nodes
pub type PeerClientData = web::Data<dyn PeerClient>;

/// Generic response carrying a human-readable note
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub note: String,
}

impl NoteResponse {
    pub fn new(note: impl Into<String>) -> Self {
        NoteResponse { note: note.into() }
    }
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    pub note: String,

    /// The newly mined block
    pub block: Block,
}

/// Response for the register-and-broadcast endpoint
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAndBroadcastResponse {
    pub note: String,

    /// Outcome of every call made to other nodes and the listing sent to the
    /// new node
    #[serde(flatten)]
    pub broadcast: BroadcastReport,
}

/// Response for the bulk registration endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BulkRegistrationResponse {
    pub note: String,

    /// Number of nodes that were not known before
    pub added: usize,
}

/// Get the full blockchain
///
/// Returns the chain, the pending transactions and the known nodes
#[utoipa::path(
    get,
    path = "/blockchain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = LedgerSnapshot)
    )
)]
pub async fn get_blockchain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.snapshot())
}

/// Create a new transaction
///
/// Adds a transaction to the pending pool
#[utoipa::path(
    post,
    path = "/transaction",
    request_body = Transaction,
    responses(
        (status = 200, description = "Transaction queued", body = NoteResponse),
        (status = 400, description = "Malformed transaction", body = NoteResponse)
    )
)]
pub async fn new_transaction(
    blockchain: BlockchainData,
    transaction: web::Json<Transaction>,
) -> impl Responder {
    let Transaction {
        amount,
        sender,
        recipient,
    } = transaction.into_inner();

    let block_index = blockchain.submit_transaction(amount, sender, recipient);

    HttpResponse::Ok().json(NoteResponse::new(format!(
        "Transaction will be added in block {}",
        block_index
    )))
}

/// Mine a new block
///
/// Runs the proof of work over the pending transactions and appends the block
#[utoipa::path(
    get,
    path = "/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 500, description = "Mining failed", body = NoteResponse)
    )
)]
pub async fn mine_block(blockchain: BlockchainData) -> impl Responder {
    let ledger = blockchain.clone();

    // The nonce search is CPU bound, keep it off the async workers
    match web::block(move || ledger.mine()).await {
        Ok(Ok(block)) => HttpResponse::Ok().json(MineResponse {
            note: "New block mined successfully".to_string(),
            block,
        }),
        Ok(Err(err)) => {
            error!("Failed to mine block: {}", err);
            HttpResponse::InternalServerError()
                .json(NoteResponse::new(format!("Failed to mine block: {}", err)))
        }
        Err(err) => {
            error!("Mining task failed: {}", err);
            HttpResponse::InternalServerError()
                .json(NoteResponse::new(format!("Mining task failed: {}", err)))
        }
    }
}

/// Register a node and broadcast it to the network
///
/// Every known node is told about the new one, and the new node receives the
/// list of known nodes
#[utoipa::path(
    post,
    path = "/register-and-broadcast-node",
    request_body = RegisterNodeRequest,
    responses(
        (status = 200, description = "Node registered and broadcast", body = RegisterAndBroadcastResponse),
        (status = 400, description = "Node already registered or malformed request", body = NoteResponse)
    )
)]
pub async fn register_and_broadcast_node(
    blockchain: BlockchainData,
    peer_client: PeerClientData,
    request: web::Json<RegisterNodeRequest>,
) -> impl Responder {
    match blockchain
        .peers()
        .register_and_broadcast(&request.new_node_url, peer_client.get_ref())
        .await
    {
        Ok(report) => HttpResponse::Ok().json(RegisterAndBroadcastResponse {
            note: "New node registered with network successfully".to_string(),
            broadcast: report,
        }),
        Err(err @ (PeerError::AlreadyRegistered(_) | PeerError::InvalidAddress(_))) => {
            HttpResponse::BadRequest().json(NoteResponse::new(err.to_string()))
        }
        Err(err) => HttpResponse::InternalServerError().json(NoteResponse::new(err.to_string())),
    }
}

/// Register a node announced by another node
///
/// Registering a known node succeeds without changing anything
#[utoipa::path(
    post,
    path = "/register-node",
    request_body = RegisterNodeRequest,
    responses(
        (status = 200, description = "Node registered", body = NoteResponse),
        (status = 400, description = "Malformed request", body = NoteResponse)
    )
)]
pub async fn register_node(
    blockchain: BlockchainData,
    request: web::Json<RegisterNodeRequest>,
) -> impl Responder {
    match blockchain.peers().register_remote(&request.new_node_url) {
        Ok(_) => HttpResponse::Ok().json(NoteResponse::new(
            "New node registered successfully with node",
        )),
        Err(err) => HttpResponse::BadRequest().json(NoteResponse::new(err.to_string())),
    }
}

/// Register several nodes at once
#[utoipa::path(
    post,
    path = "/register-nodes-bulk",
    request_body = RegisterNodesBulkRequest,
    responses(
        (status = 200, description = "Nodes registered", body = BulkRegistrationResponse),
        (status = 400, description = "Malformed request", body = NoteResponse)
    )
)]
pub async fn register_nodes_bulk(
    blockchain: BlockchainData,
    request: web::Json<RegisterNodesBulkRequest>,
) -> impl Responder {
    let added = blockchain.peers().register_bulk(&request.new_node_urls);

    HttpResponse::Ok().json(BulkRegistrationResponse {
        note: "Bulk registration successful".to_string(),
        added,
    })
}

/// Check if the blockchain is valid
#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.is_valid())
}

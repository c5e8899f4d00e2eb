use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gossip_ledger::api;
use gossip_ledger::blockchain::{self, Blockchain, HttpPeerClient, PeerClient, ProofOfWork};
use gossip_ledger::config::{Cli, NodeConfig};

// Build the ledger for this node, applying the optional mining budget
fn initialize_blockchain(config: &NodeConfig) -> Blockchain {
    let mut proof_of_work = ProofOfWork::default();
    if let Some(max_attempts) = config.max_mining_attempts {
        info!("Mining limited to {} attempts per block", max_attempts);
        proof_of_work = proof_of_work.with_max_attempts(max_attempts);
    }

    Blockchain::new(config.node_address.as_str(), config.node_url.as_str())
        .with_proof_of_work(proof_of_work)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_blockchain,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::register_and_broadcast_node,
        api::handlers::register_node,
        api::handlers::register_nodes_bulk,
        api::handlers::validate_chain
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            blockchain::LedgerSnapshot,
            blockchain::BroadcastReport,
            blockchain::PeerOutcome,
            blockchain::RegisterNodeRequest,
            blockchain::RegisterNodesBulkRequest,
            api::handlers::NoteResponse,
            api::handlers::MineResponse,
            api::handlers::RegisterAndBroadcastResponse,
            api::handlers::BulkRegistrationResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger node API endpoints")
    ),
    info(
        title = "Gossip Ledger API",
        version = "0.1.0",
        description = "A proof-of-work ledger node with gossip peer registration",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_cli(&Cli::parse_args());

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.as_str()));

    let blockchain = web::Data::new(initialize_blockchain(&config));

    let peer_client: Arc<dyn PeerClient> = Arc::new(HttpPeerClient::new(config.peer_timeout)?);
    let peer_client = web::Data::from(peer_client);

    info!(
        "Node {} ({}) listening on {}:{}",
        config.node_url, config.node_address, config.host, config.port
    );

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            .app_data(peer_client.clone())
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await?;

    Ok(())
}

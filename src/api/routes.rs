use actix_web::{error, web, HttpResponse};

use super::handlers::{self, NoteResponse};

/// Configures the API routes
///
/// Malformed JSON bodies are answered with `400` and a `note` explaining the
/// problem.
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(NoteResponse::new(format!("Invalid request body: {}", err)));
        error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .route("/blockchain", web::get().to(handlers::get_blockchain))
        .route("/transaction", web::post().to(handlers::new_transaction))
        .route("/mine", web::get().to(handlers::mine_block))
        .route(
            "/register-and-broadcast-node",
            web::post().to(handlers::register_and_broadcast_node),
        )
        .route("/register-node", web::post().to(handlers::register_node))
        .route("/register-nodes-bulk", web::post().to(handlers::register_nodes_bulk))
        .route("/validate", web::get().to(handlers::validate_chain));
}

// API module
//
// This module maps the HTTP surface onto the ledger and the peer registry

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;

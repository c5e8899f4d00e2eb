//! Command-line arguments and the resolved node configuration.

use std::time::Duration;

use clap::Parser;
use uuid::Uuid;

/// Proof-of-work ledger node.
#[derive(Parser, Debug, Clone)]
#[command(name = "gossip_ledger")]
#[command(about = "Proof-of-work ledger node with gossip peer registration")]
#[command(version)]
pub struct Cli {
    /// Port to listen on.
    #[arg(default_value_t = 3000)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Public URL other nodes use to reach this one (default: http://localhost:<PORT>).
    #[arg(long)]
    pub node_url: Option<String>,

    /// Identity credited with mining rewards (default: random).
    #[arg(long)]
    pub node_address: Option<String>,

    /// Timeout for each call to another node, in seconds.
    #[arg(long, default_value_t = 5)]
    pub peer_timeout_secs: u64,

    /// Give up mining after this many nonces (default: unbounded).
    #[arg(long)]
    pub max_mining_attempts: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub node_url: String,
    pub node_address: String,
    pub peer_timeout: Duration,
    pub max_mining_attempts: Option<u64>,
    pub log_level: String,
}

impl NodeConfig {
    /// Create a node configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            host: cli.host.clone(),
            port: cli.port,
            node_url: cli
                .node_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}", cli.port)),
            node_address: cli
                .node_address
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            peer_timeout: Duration::from_secs(cli.peer_timeout_secs),
            max_mining_attempts: cli.max_mining_attempts,
            log_level: cli.log_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = NodeConfig::from_cli(&Cli::parse_from(["gossip_ledger"]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.node_url, "http://localhost:3000");
        assert_eq!(config.peer_timeout, Duration::from_secs(5));
        assert_eq!(config.max_mining_attempts, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_generated_node_address() {
        let config = NodeConfig::from_cli(&Cli::parse_from(["gossip_ledger"]));

        assert_eq!(config.node_address.len(), 32);
        assert!(!config.node_address.contains('-'));
    }

    #[test]
    fn test_port_drives_default_url() {
        let config = NodeConfig::from_cli(&Cli::parse_from(["gossip_ledger", "3001"]));

        assert_eq!(config.port, 3001);
        assert_eq!(config.node_url, "http://localhost:3001");
    }

    #[test]
    fn test_explicit_values() {
        let cli = Cli::parse_from([
            "gossip_ledger",
            "4000",
            "--node-url",
            "http://node-a:4000",
            "--node-address",
            "miner-a",
            "--peer-timeout-secs",
            "1",
            "--max-mining-attempts",
            "1000000",
        ]);
        let config = NodeConfig::from_cli(&cli);

        assert_eq!(config.node_url, "http://node-a:4000");
        assert_eq!(config.node_address, "miner-a");
        assert_eq!(config.peer_timeout, Duration::from_secs(1));
        assert_eq!(config.max_mining_attempts, Some(1_000_000));
    }
}

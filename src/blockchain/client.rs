use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::peers::{PeerClient, PeerError};

/// Body of `POST /register-node` and `POST /register-and-broadcast-node`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeRequest {
    /// URL of the node being registered
    pub new_node_url: String,
}

/// Body of `POST /register-nodes-bulk`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodesBulkRequest {
    /// URLs of the nodes being registered
    pub new_node_urls: Vec<String>,
}

/// Delivers registration calls over HTTP
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    /// Creates a client whose calls give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(HttpPeerClient { client })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        peer_url: &str,
        path: &str,
        body: &T,
    ) -> Result<(), PeerError> {
        let url = format!("{}{}", peer_url.trim_end_matches('/'), path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PeerError::Timeout(peer_url.to_string())
                } else {
                    PeerError::Transport {
                        peer: peer_url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Rejected {
                peer: peer_url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn register_node(&self, peer_url: &str, new_node_url: &str) -> Result<(), PeerError> {
        let body = RegisterNodeRequest {
            new_node_url: new_node_url.to_string(),
        };
        self.post(peer_url, "/register-node", &body).await
    }

    async fn register_nodes_bulk(
        &self,
        peer_url: &str,
        node_urls: &[String],
    ) -> Result<(), PeerError> {
        let body = RegisterNodesBulkRequest {
            new_node_urls: node_urls.to_vec(),
        };
        self.post(peer_url, "/register-nodes-bulk", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::peers::PeerRegistry;
    use std::time::Instant;

    #[test]
    fn test_request_wire_format() {
        let body = RegisterNodeRequest {
            new_node_url: "http://localhost:3001".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"newNodeUrl":"http://localhost:3001"}"#
        );

        let bulk: RegisterNodesBulkRequest =
            serde_json::from_str(r#"{"newNodeUrls":["http://a","http://b"]}"#).unwrap();
        assert_eq!(bulk.new_node_urls, vec!["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_captured() {
        let client = HttpPeerClient::new(Duration::from_secs(2)).unwrap();

        // Nothing listens on port 1
        let result = client.register_node("http://127.0.0.1:1", "http://new").await;
        assert!(matches!(result, Err(PeerError::Transport { .. })));

        let peers = PeerRegistry::new(Some("http://self".to_string()));
        peers.register_remote("http://127.0.0.1:1").unwrap();

        let report = peers.register_and_broadcast("http://127.0.0.1:2", &client).await.unwrap();

        assert_eq!(report.notified.len(), 1);
        assert!(!report.notified[0].delivered);
        assert!(!report.bulk.unwrap().delivered);
        assert_eq!(peers.len(), 2);
    }

    #[tokio::test]
    async fn test_hung_peer_times_out() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let hung_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = HttpPeerClient::new(Duration::from_secs(1)).unwrap();
        let peers = PeerRegistry::new(None);
        peers.register_remote(&hung_url).unwrap();

        let started = Instant::now();
        let report = peers.register_and_broadcast("http://127.0.0.1:2", &client).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_secs(4), "broadcast took {:?}", elapsed);
        assert_eq!(report.notified.len(), 1);
        assert_eq!(report.notified[0].peer, hung_url);
        assert!(!report.notified[0].delivered);
        assert!(report.notified[0].error.as_deref().unwrap().contains("did not answer in time"));
        assert!(peers.contains(&hung_url));
    }
}

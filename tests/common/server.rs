//! Test server management.

use std::net::SocketAddr;

use ibrcd::config::{Config, ParentConfig};
use ibrcd::Server;
use tokio::task::JoinHandle;

/// A server running on the test runtime. Dropping it kills the server and
/// closes every route it owns.
pub struct TestServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a root server on an ephemeral loopback port.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::start(None).await
    }

    /// Start a server attached to `parent`.
    pub async fn spawn_child(parent: &TestServer) -> anyhow::Result<Self> {
        let parent = ParentConfig {
            host: parent.addr.ip().to_string(),
            port: parent.addr.port(),
        };
        Self::start(Some(parent)).await
    }

    async fn start(parent: Option<ParentConfig>) -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.server.listen = "127.0.0.1:0".parse()?;
        config.parent = parent;

        let server = Server::bind(&config).await?;
        let addr = server.local_addr();
        let task = tokio::spawn(async move {
            let _ = server.run().await;
        });
        Ok(Self { addr, task })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Open a client connection to this server.
    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(self.addr).await
    }

    /// Open a client and complete `CONNECT <host>`.
    pub async fn connect_as(&self, host: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect().await?;
        client.send(&format!("CONNECT {}", host)).await?;
        client.expect(&format!("STATUS {} 100", host)).await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

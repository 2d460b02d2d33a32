//! `XiangqiServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → hub. One process, one
//! `SessionHub`, any number of connections — mirrors the single in-memory
//! server the wire protocol was distilled from, just split across Tokio
//! tasks instead of a single asyncio event loop.

use std::sync::Arc;

use tokio::sync::Mutex;
use xiangqi_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::hub::SessionHub;
use crate::ServerError;

/// Default bind address, matching the original server's `0.0.0.0:8767`.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8767";

/// Builder for configuring and starting a Xiangqi server.
pub struct XiangqiServerBuilder {
    bind_addr: String,
}

impl XiangqiServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub async fn build(self) -> Result<XiangqiServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(XiangqiServer {
            transport,
            hub: Arc::new(Mutex::new(SessionHub::new())),
        })
    }
}

impl Default for XiangqiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Xiangqi server.
pub struct XiangqiServer {
    transport: WebSocketTransport,
    hub: Arc<Mutex<SessionHub>>,
}

impl XiangqiServer {
    pub fn builder() -> XiangqiServerBuilder {
        XiangqiServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one task per connection, until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("xiangqi server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let hub = Arc::clone(&self.hub);
                    tokio::spawn(async move {
                        handle_connection(conn, hub).await;
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

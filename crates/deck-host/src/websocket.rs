//! Simulated websocket server
//!
//! No socket is bound; the server only records the port it was asked to use.

use std::time::Instant;

use tracing::info;

/// A running simulated websocket server
#[derive(Debug, Clone)]
pub struct WsServer {
    port: u16,
    started_at: Instant,
}

impl WsServer {
    /// Start a simulated server for `port`
    pub fn start(port: u16) -> Self {
        info!("Simulated websocket server on 127.0.0.1:{}", port);
        Self {
            port,
            started_at: Instant::now(),
        }
    }

    /// Listen port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address clients connect to
    pub fn address(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Time since the server started
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stop the simulated server
    pub fn stop(self) {
        info!(
            "Simulated websocket server on port {} stopped after {:?}",
            self.port,
            self.uptime()
        );
    }
}

// src/integrations/api_transport.rs
//
// HTTP/WebSocket server running outside the control loop. Incoming requests
// are dispatched back through `ApiProvider::dispatch`; outgoing socket pushes
// go through `send`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

/// Socket channel used for pushes to API clients.
pub const SOCKET_CHANNEL: &str = "socket";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Start serving with a snapshot of the settings document. Returns the
    /// server's process/worker id.
    async fn start(&self, settings: Value) -> AppResult<u32>;
    async fn stop(&self) -> AppResult<()>;
    fn send(&self, channel: &str, event: &str, payload: Value) -> AppResult<()>;
}

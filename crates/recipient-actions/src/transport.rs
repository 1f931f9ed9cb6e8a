//! Seam between the framework and the bridge client.

use async_trait::async_trait;
use bridge_client::{ApiRequest, ApiResponse, BridgeClient, BridgeError};

/// Anything that can carry an [`ApiRequest`] to the bridge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BridgeError>;
}

#[async_trait]
impl Transport for BridgeClient {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, BridgeError> {
        BridgeClient::execute(self, request).await
    }
}

//! Common test utilities for integration tests.

use bridge_client::BridgeClient;
use std::sync::Arc;
use wa_console::commands::{dispatch, registry, CommandHandler};
use wa_console::session::{Session, SessionSettings};
use wiremock::MockServer;

/// Start a mock bridge server.
pub async fn mock_bridge_server() -> MockServer {
    MockServer::start().await
}

/// A console session talking to the mock bridge.
pub struct TestConsole {
    pub session: Arc<Session>,
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl TestConsole {
    pub fn new(mock_server: &MockServer, settings: SessionSettings) -> Self {
        let client = BridgeClient::new(mock_server.uri()).unwrap();
        let session = Arc::new(Session::new(client, settings));
        let handlers = registry(session.clone());
        Self { session, handlers }
    }

    /// Run one input line and return what would be printed.
    pub async fn run(&self, line: &str) -> String {
        dispatch(&self.handlers, self.session.presenter(), line)
            .await
            .unwrap_or_default()
    }
}

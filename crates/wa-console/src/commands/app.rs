//! App command - login, pairing and connection of the selected device.

use crate::commands::{fill_recipient, unknown_action, CommandHandler};
use crate::error::AppResult;
use crate::input::CommandLine;
use crate::session::Session;
use async_trait::async_trait;
use recipient_actions::forms::LoginWithCodeForm;
use recipient_actions::{QrLoginRefresher, QrState, SubmissionController, SubmitOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long `app login` waits for the first QR code.
const FIRST_QR_TIMEOUT: Duration = Duration::from_secs(15);

pub struct AppHandler {
    session: Arc<Session>,
    controller: SubmissionController,
}

impl AppHandler {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            controller: session.controller(),
            session,
        }
    }

    async fn login(&self) -> AppResult<String> {
        let client = Arc::new(self.session.client().await);
        let mut slot = self.session.qr().await;
        if let Some(mut previous) = slot.take() {
            previous.stop();
        }

        let mut refresher = QrLoginRefresher::new(client);
        let mut updates = refresher.subscribe();
        refresher.start();
        *slot = Some(refresher);
        drop(slot);

        let first = tokio::time::timeout(FIRST_QR_TIMEOUT, async {
            loop {
                if updates.changed().await.is_err() {
                    return None;
                }
                let state = updates.borrow_and_update().clone();
                if state.link.is_some() || state.error.is_some() {
                    return Some(state);
                }
            }
        })
        .await;

        match first {
            Ok(Some(state)) => Ok(self.render_qr(&state)),
            Ok(None) => Ok(self.session.error("QR login stopped")),
            Err(_) => {
                warn!("No QR code within {:?}", FIRST_QR_TIMEOUT);
                Ok(self.session.error("The bridge did not return a QR code in time"))
            }
        }
    }

    async fn qr_status(&self) -> AppResult<String> {
        let slot = self.session.qr().await;
        match slot.as_ref() {
            Some(refresher) => Ok(self.render_qr(&refresher.state())),
            None => Ok(self.session.error("No QR login running, use app login")),
        }
    }

    async fn stop(&self) -> AppResult<String> {
        match self.session.qr().await.take() {
            Some(mut refresher) => {
                refresher.stop();
                Ok(self.session.success("QR login stopped"))
            }
            None => Ok(self.session.error("No QR login running")),
        }
    }

    fn render_qr(&self, state: &QrState) -> String {
        if let Some(error) = &state.error {
            return self.session.error(error.clone());
        }
        match &state.link {
            Some(link) if state.running => self.session.success(format!(
                "Scan the QR code at {} (expires in {}s, code #{})",
                link, state.remaining_secs, state.fetches
            )),
            Some(link) => self
                .session
                .success(format!("Last QR code was {} (refresh stopped)", link)),
            None => self.session.error("Waiting for the first QR code"),
        }
    }

    async fn login_with_code(&self, line: &CommandLine) -> AppResult<String> {
        let mut form = LoginWithCodeForm::default();
        fill_recipient(&mut form, line)?;

        let outcome = self.controller.submit(&mut form).await;
        if let SubmitOutcome::Succeeded { results, .. } = &outcome {
            if let Some(code) = results.get("pair_code").and_then(|c| c.as_str()) {
                info!("Pair code issued");
                return Ok(self
                    .session
                    .success(format!("Enter pair code {} on the phone", code)));
            }
        }
        Ok(self.session.render_outcome(&outcome))
    }

    async fn logout(&self) -> AppResult<String> {
        if let Some(mut refresher) = self.session.qr().await.take() {
            refresher.stop();
        }
        let message = self.session.client().await.logout().await?;
        Ok(self.session.success(message))
    }

    async fn reconnect(&self) -> AppResult<String> {
        let message = self.session.client().await.reconnect().await?;
        Ok(self.session.success(message))
    }
}

#[async_trait]
impl CommandHandler for AppHandler {
    fn name(&self) -> &str {
        "app"
    }

    async fn execute(&self, line: &CommandLine) -> AppResult<String> {
        match line.action() {
            "login" => self.login().await,
            "qr" => self.qr_status().await,
            "stop" => self.stop().await,
            "login-code" => self.login_with_code(line).await,
            "logout" => self.logout().await,
            "reconnect" => self.reconnect().await,
            other => Err(unknown_action("app", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSettings;
    use bridge_client::BridgeClient;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(server: &MockServer) -> AppHandler {
        let client = BridgeClient::new(server.uri()).unwrap();
        AppHandler::new(Arc::new(Session::new(client, SessionSettings::default())))
    }

    fn line(input: &str) -> CommandLine {
        CommandLine::parse(input).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_login_shows_first_qr() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Success",
                "results": {"qr_link": "http://bridge/qr/1.png", "qr_duration": 30}
            })))
            .mount(&server)
            .await;

        let handler = handler(&server);
        let output = handler.execute(&line("app login")).await.unwrap();

        assert!(output.starts_with("[ok] Scan the QR code at http://bridge/qr/1.png"));
        assert!(output.contains("expires in 30s"));

        let stopped = handler.execute(&line("app stop")).await.unwrap();
        assert_eq!(stopped, "[ok] QR login stopped");
    }

    #[tokio::test]
    async fn test_login_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/login"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": "ALREADY_LOGGED_IN",
                "message": "you are already logged in"
            })))
            .mount(&server)
            .await;

        let output = handler(&server).execute(&line("app login")).await.unwrap();
        assert_eq!(output, "[error] you are already logged in");
    }

    #[tokio::test]
    async fn test_login_code_shows_pair_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/login-with-code"))
            .and(query_param("phone", "5511999999999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Success",
                "results": {"pair_code": "ABCD-1234"}
            })))
            .mount(&server)
            .await;

        let output = handler(&server)
            .execute(&line("app login-code to=+5511999999999"))
            .await
            .unwrap();
        assert_eq!(output, "[ok] Enter pair code ABCD-1234 on the phone");
    }

    #[tokio::test]
    async fn test_qr_without_login() {
        let server = MockServer::start().await;
        let output = handler(&server).execute(&line("app qr")).await.unwrap();
        assert_eq!(output, "[error] No QR login running, use app login");
    }
}
